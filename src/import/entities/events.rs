use std::collections::BTreeMap;

use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::{normalize_enum_token, parse_boolish, parse_iso_date};
use crate::import::names::normalize_name;
use crate::import::store::now_unix_string;
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

pub const EVENT_TYPES: &[&str] = &["EXAM", "HOLIDAY", "MEETING", "ACTIVITY", "OTHER"];

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "title",
        aliases: &["title", "event", "event title", "name"],
        required: true,
    },
    ColumnSpec {
        field: "startDate",
        aliases: &["start date", "startdate", "start", "date"],
        required: true,
    },
    ColumnSpec {
        field: "endDate",
        aliases: &["end date", "enddate", "end"],
        required: false,
    },
    ColumnSpec {
        field: "type",
        aliases: &["type", "event type", "category"],
        required: false,
    },
    ColumnSpec {
        field: "recurring",
        aliases: &["recurring", "repeats", "repeat"],
        required: false,
    },
];

pub struct EventImporter;

impl EntityImporter for EventImporter {
    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn validate(&self, ctx: &ImportContext, row_index: usize, row: &RowView) -> ValidatedRow {
        let mut data = BTreeMap::new();
        let mut errors = Vec::new();

        let title = row.text("title").unwrap_or_default().to_string();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        }
        data.insert("title".to_string(), title.clone());

        let start = match row.text("startDate") {
            Some(raw) => match parse_iso_date(raw) {
                Some(d) => Some(d),
                None => {
                    errors.push(format!("Invalid start date: {raw}"));
                    None
                }
            },
            None => {
                errors.push("Start date is required".to_string());
                None
            }
        };
        if let Some(d) = start {
            data.insert("startDate".to_string(), d.format("%Y-%m-%d").to_string());
        }

        // endDate defaults to startDate and must not precede it.
        let end = match row.text("endDate") {
            Some(raw) => match parse_iso_date(raw) {
                Some(d) => Some(d),
                None => {
                    errors.push(format!("Invalid end date: {raw}"));
                    None
                }
            },
            None => start,
        };
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                errors.push("End date must be after start date".to_string());
            }
        }
        if let Some(d) = end {
            data.insert("endDate".to_string(), d.format("%Y-%m-%d").to_string());
        }

        let event_type = match row.text("type") {
            Some(raw) => {
                let token = normalize_enum_token(raw);
                if !EVENT_TYPES.contains(&token.as_str()) {
                    errors.push(format!(
                        "Invalid event type: {raw} (valid: {})",
                        EVENT_TYPES.join(", ")
                    ));
                }
                token
            }
            None => "OTHER".to_string(),
        };
        data.insert("type".to_string(), event_type);
        data.insert(
            "recurring".to_string(),
            parse_boolish(row.text("recurring").unwrap_or("")).to_string(),
        );

        // Compound match key: normalized title plus the exact start date.
        let matched = if errors.is_empty() {
            let start_iso = data.get("startDate").cloned().unwrap_or_default();
            let title_key = normalize_name(&title);
            ctx.snapshot
                .events
                .iter()
                .find(|e| normalize_name(&e.title) == title_key && e.start_date == start_iso)
                .map(|e| e.id.clone())
        } else {
            None
        };

        ValidatedRow::classify(row_index, data, errors, matched)
    }

    fn commit_row(
        &self,
        tx: &Transaction,
        ctx: &ImportContext,
        row: &ValidatedRow,
    ) -> anyhow::Result<()> {
        let recurring = if field(row, "recurring") == "true" { 1 } else { 0 };
        let now = now_unix_string();
        match &row.matched_id {
            Some(id) => {
                tx.execute(
                    "UPDATE events SET title = ?, event_type = ?, start_date = ?,
                         end_date = ?, recurring = ?, updated_at = ?
                     WHERE id = ? AND school_id = ?",
                    (
                        field(row, "title"),
                        field(row, "type"),
                        field(row, "startDate"),
                        field(row, "endDate"),
                        recurring,
                        &now,
                        id,
                        ctx.school_id,
                    ),
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO events(id, school_id, title, event_type, start_date,
                         end_date, recurring, updated_at)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        ctx.school_id,
                        field(row, "title"),
                        field(row, "type"),
                        field(row, "startDate"),
                        field(row, "endDate"),
                        recurring,
                        &now,
                    ),
                )?;
            }
        }
        Ok(())
    }
}
