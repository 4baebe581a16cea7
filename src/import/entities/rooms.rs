use std::collections::BTreeMap;

use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::{normalize_enum_token, parse_positive_int};
use crate::import::names::find_by_name;
use crate::import::store::now_unix_string;
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

pub const ROOM_TYPES: &[&str] = &[
    "CLASSROOM",
    "LAB",
    "GYM",
    "LIBRARY",
    "AUDITORIUM",
    "OFFICE",
    "OTHER",
];

const DEFAULT_CAPACITY: i64 = 30;

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "name",
        aliases: &["name", "room", "room name", "nom"],
        required: true,
    },
    ColumnSpec {
        field: "capacity",
        aliases: &["capacity", "seats", "capacite"],
        required: false,
    },
    ColumnSpec {
        field: "type",
        aliases: &["type", "room type", "kind"],
        required: false,
    },
];

pub struct RoomImporter;

impl EntityImporter for RoomImporter {
    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn validate(&self, ctx: &ImportContext, row_index: usize, row: &RowView) -> ValidatedRow {
        let mut data = BTreeMap::new();
        let mut errors = Vec::new();

        let name = row.text("name").unwrap_or_default().to_string();
        if name.is_empty() {
            errors.push("Name is required".to_string());
        }
        data.insert("name".to_string(), name.clone());

        match parse_positive_int(row.text("capacity"), DEFAULT_CAPACITY, "Capacity") {
            Ok(n) => {
                data.insert("capacity".to_string(), n.to_string());
            }
            Err(e) => errors.push(e),
        }

        let room_type = match row.text("type") {
            Some(raw) => {
                let token = normalize_enum_token(raw);
                if !ROOM_TYPES.contains(&token.as_str()) {
                    errors.push(format!(
                        "Invalid room type: {raw} (valid: {})",
                        ROOM_TYPES.join(", ")
                    ));
                }
                token
            }
            None => "CLASSROOM".to_string(),
        };
        data.insert("type".to_string(), room_type);

        let matched = if errors.is_empty() && !name.is_empty() {
            find_by_name(&ctx.snapshot.rooms, &name, |r| r.name.as_str()).map(|r| r.id.clone())
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
        let now = now_unix_string();
        match &row.matched_id {
            Some(id) => {
                tx.execute(
                    "UPDATE rooms SET name = ?, capacity = ?, room_type = ?, updated_at = ?
                     WHERE id = ? AND school_id = ?",
                    (
                        field(row, "name"),
                        field(row, "capacity"),
                        field(row, "type"),
                        &now,
                        id,
                        ctx.school_id,
                    ),
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO rooms(id, school_id, name, capacity, room_type, updated_at)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        ctx.school_id,
                        field(row, "name"),
                        field(row, "capacity"),
                        field(row, "type"),
                        &now,
                    ),
                )?;
            }
        }
        Ok(())
    }
}
