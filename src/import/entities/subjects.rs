use std::collections::BTreeMap;

use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::normalize_enum_token;
use crate::import::names::find_by_name;
use crate::import::store::now_unix_string;
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

pub const CATEGORIES: &[&str] = &[
    "SCIENCES",
    "LITERATURE",
    "LANGUAGES",
    "ARTS",
    "SPORT",
    "TECHNOLOGY",
    "OTHER",
];

const DEFAULT_COLOR: &str = "#2563eb";

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "name",
        aliases: &["name", "subject", "subject name", "nom"],
        required: true,
    },
    ColumnSpec {
        field: "category",
        aliases: &["category", "categorie", "group"],
        required: false,
    },
    ColumnSpec {
        field: "color",
        aliases: &["color", "colour", "couleur"],
        required: false,
    },
];

pub struct SubjectImporter;

impl EntityImporter for SubjectImporter {
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

        let category = match row.text("category") {
            Some(raw) => {
                let token = normalize_enum_token(raw);
                if !CATEGORIES.contains(&token.as_str()) {
                    errors.push(format!(
                        "Invalid category: {raw} (valid: {})",
                        CATEGORIES.join(", ")
                    ));
                }
                token
            }
            None => "OTHER".to_string(),
        };
        data.insert("category".to_string(), category);
        data.insert(
            "color".to_string(),
            row.text("color").unwrap_or(DEFAULT_COLOR).to_string(),
        );

        let matched = if errors.is_empty() && !name.is_empty() {
            find_by_name(&ctx.snapshot.subjects, &name, |s| s.name.as_str())
                .map(|s| s.id.clone())
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
                    "UPDATE subjects SET name = ?, category = ?, color = ?, updated_at = ?
                     WHERE id = ? AND school_id = ?",
                    (
                        field(row, "name"),
                        field(row, "category"),
                        field(row, "color"),
                        &now,
                        id,
                        ctx.school_id,
                    ),
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO subjects(id, school_id, name, category, color, updated_at)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        ctx.school_id,
                        field(row, "name"),
                        field(row, "category"),
                        field(row, "color"),
                        &now,
                    ),
                )?;
            }
        }
        Ok(())
    }
}
