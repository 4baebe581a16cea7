use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use anyhow::anyhow;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::EntityImporter;
use crate::import::fields::{parse_int_in_range, parse_positive_int};
use crate::import::names::{find_by_name, normalize_name, resolve_or_report};
use crate::import::store::{now_unix_string, replace_grade_curriculum};
use crate::import::types::{RowStatus, ValidatedRow};
use crate::import::ImportContext;

const DEFAULT_LEVEL: i64 = 1;
const DEFAULT_HOURS: i64 = 2;

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "name",
        aliases: &["grade", "grade name", "name", "niveau"],
        required: true,
    },
    ColumnSpec {
        field: "level",
        aliases: &["level", "grade level"],
        required: false,
    },
    ColumnSpec {
        field: "subject",
        aliases: &["subject", "subject name", "matiere"],
        required: false,
    },
    ColumnSpec {
        field: "hoursPerWeek",
        aliases: &["hours per week", "hours/week", "hours", "weekly hours"],
        required: false,
    },
];

/// One logical grade operation folded out of several curriculum rows.
/// Level and match come from the first row seen for the grade; a repeated
/// subject overwrites its hours (last write wins).
#[derive(Debug)]
pub(crate) struct GradeGroup {
    pub name: String,
    pub level: i64,
    pub matched_id: Option<String>,
    pub subject_hours: Vec<(String, i64)>,
}

pub(crate) fn fold_groups(
    ctx: &ImportContext,
    rows: &[ValidatedRow],
) -> anyhow::Result<Vec<GradeGroup>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, GradeGroup> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.status != RowStatus::Error) {
        let name = row.data.get("name").cloned().unwrap_or_default();
        let key = normalize_name(&name);
        let group = match groups.entry(key.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                let level = row
                    .data
                    .get("level")
                    .and_then(|l| l.parse::<i64>().ok())
                    .unwrap_or(DEFAULT_LEVEL);
                order.push(key.clone());
                v.insert(GradeGroup {
                    name,
                    level,
                    matched_id: row.matched_id.clone(),
                    subject_hours: Vec::new(),
                })
            }
        };

        let Some(subject_name) = row.data.get("subject") else {
            continue;
        };
        let subject = find_by_name(&ctx.snapshot.subjects, subject_name, |s| s.name.as_str())
            .ok_or_else(|| anyhow!("subject disappeared during commit: {subject_name}"))?;
        let hours = row
            .data
            .get("hoursPerWeek")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_HOURS);

        match group
            .subject_hours
            .iter_mut()
            .find(|(id, _)| *id == subject.id)
        {
            Some(entry) => entry.1 = hours,
            None => group.subject_hours.push((subject.id.clone(), hours)),
        }
    }

    // Creation order follows first appearance in the file.
    Ok(order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect())
}

pub struct GradeImporter;

impl EntityImporter for GradeImporter {
    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn validate(&self, ctx: &ImportContext, row_index: usize, row: &RowView) -> ValidatedRow {
        let mut data = BTreeMap::new();
        let mut errors = Vec::new();

        let name = row.text("name").unwrap_or_default().to_string();
        if name.is_empty() {
            errors.push("Grade name is required".to_string());
        }
        data.insert("name".to_string(), name.clone());

        match parse_positive_int(row.text("level"), DEFAULT_LEVEL, "Level") {
            Ok(n) => {
                data.insert("level".to_string(), n.to_string());
            }
            Err(e) => errors.push(e),
        }

        if let Some(subject) = row.text("subject") {
            data.insert("subject".to_string(), subject.to_string());
            resolve_or_report(
                &ctx.snapshot.subjects,
                subject,
                "subject",
                |s| s.name.as_str(),
                &mut errors,
            );
        }
        match parse_int_in_range(row.text("hoursPerWeek"), DEFAULT_HOURS, 1, 20, "Hours per week")
        {
            Ok(n) => {
                data.insert("hoursPerWeek".to_string(), n.to_string());
            }
            Err(e) => errors.push(e),
        }

        let matched = if errors.is_empty() && !name.is_empty() {
            find_by_name(&ctx.snapshot.grades, &name, |g| g.name.as_str()).map(|g| g.id.clone())
        } else {
            None
        };

        ValidatedRow::classify(row_index, data, errors, matched)
    }

    fn commit_row(
        &self,
        _tx: &Transaction,
        _ctx: &ImportContext,
        _row: &ValidatedRow,
    ) -> anyhow::Result<()> {
        // Grades never commit row by row; see commit_rows.
        Err(anyhow!("grade rows commit through grouping"))
    }

    /// Commit-mode grouping stage: rows for the same grade collapse into one
    /// upsert, and the grade's curriculum links are replaced wholesale.
    fn commit_rows(
        &self,
        tx: &Transaction,
        ctx: &ImportContext,
        rows: &[ValidatedRow],
    ) -> anyhow::Result<()> {
        let now = now_unix_string();
        for group in fold_groups(ctx, rows)? {
            let grade_id = match &group.matched_id {
                Some(id) => {
                    tx.execute(
                        "UPDATE grades SET name = ?, level = ?, updated_at = ?
                         WHERE id = ? AND school_id = ?",
                        (&group.name, group.level, &now, id, ctx.school_id),
                    )?;
                    id.clone()
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO grades(id, school_id, name, level, updated_at)
                         VALUES(?, ?, ?, ?, ?)",
                        (&id, ctx.school_id, &group.name, group.level, &now),
                    )?;
                    id
                }
            };
            replace_grade_curriculum(tx, &grade_id, &group.subject_hours)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::snapshot::{NamedRef, Snapshot};
    use crate::import::ImportContext;

    fn ctx_with_subjects(names: &[(&str, &str)]) -> ImportContext<'static> {
        let mut snapshot = Snapshot::default();
        snapshot.subjects = names
            .iter()
            .map(|(id, name)| NamedRef {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        ImportContext {
            school_id: "school-1",
            timetable_id: None,
            snapshot,
        }
    }

    fn row(index: usize, entries: &[(&str, &str)]) -> ValidatedRow {
        let data = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ValidatedRow::classify(index, data, Vec::new(), None)
    }

    #[test]
    fn rows_for_same_grade_fold_into_one_group() {
        let ctx = ctx_with_subjects(&[("s-math", "Math"), ("s-phy", "Physics")]);
        let rows = vec![
            row(1, &[("name", "Grade 7"), ("level", "7"), ("subject", "Math"), ("hoursPerWeek", "4")]),
            row(2, &[("name", "grade  7"), ("level", "9"), ("subject", "Physics"), ("hoursPerWeek", "3")]),
        ];
        let groups = fold_groups(&ctx, &rows).expect("fold");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Grade 7");
        assert_eq!(groups[0].level, 7, "level comes from the first row seen");
        assert_eq!(
            groups[0].subject_hours,
            vec![("s-math".to_string(), 4), ("s-phy".to_string(), 3)]
        );
    }

    #[test]
    fn repeated_subject_is_last_write_wins() {
        let ctx = ctx_with_subjects(&[("s-math", "Math")]);
        let rows = vec![
            row(1, &[("name", "Grade 7"), ("subject", "Math"), ("hoursPerWeek", "4")]),
            row(2, &[("name", "Grade 7"), ("subject", "MATH"), ("hoursPerWeek", "6")]),
        ];
        let groups = fold_groups(&ctx, &rows).expect("fold");
        assert_eq!(groups[0].subject_hours, vec![("s-math".to_string(), 6)]);
    }

    #[test]
    fn error_rows_are_excluded_and_order_follows_first_appearance() {
        let ctx = ctx_with_subjects(&[("s-math", "Math")]);
        let bad = ValidatedRow::classify(
            1,
            [("name".to_string(), "Grade 9".to_string())].into(),
            vec!["Unknown subject: Drawing".to_string()],
            None,
        );
        let rows = vec![
            bad,
            row(2, &[("name", "Grade 8"), ("subject", "Math")]),
            row(3, &[("name", "Grade 7"), ("subject", "Math")]),
        ];
        let groups = fold_groups(&ctx, &rows).expect("fold");
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Grade 8", "Grade 7"]);
    }
}
