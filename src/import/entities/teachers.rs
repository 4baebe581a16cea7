use std::collections::BTreeMap;

use anyhow::anyhow;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::{looks_like_email, parse_positive_int};
use crate::import::names::{find_by_name, resolve_or_report};
use crate::import::store::{now_unix_string, replace_teacher_subjects};
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

const DEFAULT_MAX_PER_DAY: i64 = 6;
const DEFAULT_MAX_PER_WEEK: i64 = 24;

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "name",
        aliases: &["name", "full name", "teacher", "teacher name", "nom"],
        required: true,
    },
    ColumnSpec {
        field: "email",
        aliases: &["email", "e-mail", "mail", "courriel"],
        required: false,
    },
    ColumnSpec {
        field: "phone",
        aliases: &["phone", "phone number", "tel", "telephone"],
        required: false,
    },
    ColumnSpec {
        field: "subjects",
        aliases: &["subjects", "subject", "taught subjects", "matieres"],
        required: false,
    },
    ColumnSpec {
        field: "maxPeriodsPerDay",
        aliases: &["max periods per day", "max periods/day", "periods per day"],
        required: false,
    },
    ColumnSpec {
        field: "maxPeriodsPerWeek",
        aliases: &["max periods per week", "max periods/week", "periods per week"],
        required: false,
    },
];

pub struct TeacherImporter;

impl EntityImporter for TeacherImporter {
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

        if let Some(email) = row.text("email") {
            if !looks_like_email(email) {
                errors.push(format!("Invalid email: {email}"));
            }
            data.insert("email".to_string(), email.to_string());
        }
        if let Some(phone) = row.text("phone") {
            data.insert("phone".to_string(), phone.to_string());
        }

        match parse_positive_int(
            row.text("maxPeriodsPerDay"),
            DEFAULT_MAX_PER_DAY,
            "Max periods per day",
        ) {
            Ok(n) => {
                data.insert("maxPeriodsPerDay".to_string(), n.to_string());
            }
            Err(e) => errors.push(e),
        }
        match parse_positive_int(
            row.text("maxPeriodsPerWeek"),
            DEFAULT_MAX_PER_WEEK,
            "Max periods per week",
        ) {
            Ok(n) => {
                data.insert("maxPeriodsPerWeek".to_string(), n.to_string());
            }
            Err(e) => errors.push(e),
        }

        // Every unresolved subject name is reported, not just the first.
        if let Some(list) = row.text("subjects") {
            data.insert("subjects".to_string(), list.to_string());
            for part in list.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                resolve_or_report(
                    &ctx.snapshot.subjects,
                    part,
                    "subject",
                    |s| s.name.as_str(),
                    &mut errors,
                );
            }
        }

        let matched = if errors.is_empty() && !name.is_empty() {
            find_by_name(&ctx.snapshot.teachers, &name, |t| t.name.as_str())
                .map(|t| t.id.clone())
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
        let mut subject_ids = Vec::new();
        if let Some(list) = row.data.get("subjects") {
            for part in list.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                let subject = find_by_name(&ctx.snapshot.subjects, part, |s| s.name.as_str())
                    .ok_or_else(|| anyhow!("subject disappeared during commit: {part}"))?;
                subject_ids.push(subject.id.clone());
            }
        }

        let now = now_unix_string();
        let teacher_id = match &row.matched_id {
            Some(id) => {
                tx.execute(
                    "UPDATE teachers
                     SET name = ?, email = ?, phone = ?, max_periods_per_day = ?,
                         max_periods_per_week = ?, updated_at = ?
                     WHERE id = ? AND school_id = ?",
                    (
                        field(row, "name"),
                        row.data.get("email"),
                        row.data.get("phone"),
                        field(row, "maxPeriodsPerDay"),
                        field(row, "maxPeriodsPerWeek"),
                        &now,
                        id,
                        ctx.school_id,
                    ),
                )?;
                id.clone()
            }
            None => {
                let id = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO teachers(id, school_id, name, email, phone,
                         max_periods_per_day, max_periods_per_week, updated_at)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        &id,
                        ctx.school_id,
                        field(row, "name"),
                        row.data.get("email"),
                        row.data.get("phone"),
                        field(row, "maxPeriodsPerDay"),
                        field(row, "maxPeriodsPerWeek"),
                        &now,
                    ),
                )?;
                id
            }
        };

        replace_teacher_subjects(tx, &teacher_id, &subject_ids)?;
        Ok(())
    }
}
