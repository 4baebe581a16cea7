use std::collections::BTreeMap;

use anyhow::anyhow;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::parse_positive_int;
use crate::import::names::{find_by_name, resolve_or_report};
use crate::import::store::now_unix_string;
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

const DEFAULT_CAPACITY: i64 = 30;

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "name",
        aliases: &["name", "class", "class name", "nom"],
        required: true,
    },
    ColumnSpec {
        field: "capacity",
        aliases: &["capacity", "size", "seats", "capacite"],
        required: false,
    },
    ColumnSpec {
        field: "grade",
        aliases: &["grade", "grade name", "level name", "niveau"],
        required: false,
    },
];

pub struct ClassImporter;

impl EntityImporter for ClassImporter {
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

        if let Some(grade) = row.text("grade") {
            data.insert("grade".to_string(), grade.to_string());
            resolve_or_report(
                &ctx.snapshot.grades,
                grade,
                "grade",
                |g| g.name.as_str(),
                &mut errors,
            );
        }

        let matched = if errors.is_empty() && !name.is_empty() {
            find_by_name(&ctx.snapshot.classes, &name, |c| c.name.as_str())
                .map(|c| c.id.clone())
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
        let grade_id = match row.data.get("grade") {
            Some(grade) => Some(
                find_by_name(&ctx.snapshot.grades, grade, |g| g.name.as_str())
                    .map(|g| g.id.clone())
                    .ok_or_else(|| anyhow!("grade disappeared during commit: {grade}"))?,
            ),
            None => None,
        };

        let now = now_unix_string();
        match &row.matched_id {
            Some(id) => {
                tx.execute(
                    "UPDATE classes SET name = ?, capacity = ?, grade_id = ?, updated_at = ?
                     WHERE id = ? AND school_id = ?",
                    (
                        field(row, "name"),
                        field(row, "capacity"),
                        &grade_id,
                        &now,
                        id,
                        ctx.school_id,
                    ),
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO classes(id, school_id, name, capacity, grade_id, updated_at)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        ctx.school_id,
                        field(row, "name"),
                        field(row, "capacity"),
                        &grade_id,
                        &now,
                    ),
                )?;
            }
        }
        Ok(())
    }
}
