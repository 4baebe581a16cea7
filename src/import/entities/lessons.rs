use std::collections::BTreeMap;

use anyhow::anyhow;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::entities::{field, EntityImporter};
use crate::import::fields::parse_weekday;
use crate::import::names::{find_by_name, normalize_name, resolve_or_report};
use crate::import::snapshot::PeriodRef;
use crate::import::types::ValidatedRow;
use crate::import::ImportContext;

static COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "day",
        aliases: &["day", "weekday", "jour"],
        required: true,
    },
    ColumnSpec {
        field: "period",
        aliases: &["period", "period label", "slot", "hour"],
        required: true,
    },
    ColumnSpec {
        field: "class",
        aliases: &["class", "class name", "classe"],
        required: true,
    },
    ColumnSpec {
        field: "subject",
        aliases: &["subject", "subject name", "matiere"],
        required: true,
    },
    ColumnSpec {
        field: "teacher",
        aliases: &["teacher", "teacher name", "enseignant"],
        required: true,
    },
    ColumnSpec {
        field: "room",
        aliases: &["room", "room name", "salle"],
        required: false,
    },
];

/// Periods resolve by label first, then by their position number.
fn find_period<'a>(periods: &'a [PeriodRef], raw: &str) -> Option<&'a PeriodRef> {
    let key = normalize_name(raw);
    if let Some(p) = periods.iter().find(|p| normalize_name(&p.label) == key) {
        return Some(p);
    }
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| periods.iter().find(|p| p.number == n))
}

pub struct LessonImporter;

impl EntityImporter for LessonImporter {
    fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    fn validate(&self, ctx: &ImportContext, row_index: usize, row: &RowView) -> ValidatedRow {
        let mut data = BTreeMap::new();
        let mut errors = Vec::new();

        match row.text("day") {
            Some(raw) => match parse_weekday(raw) {
                Some(day) => {
                    data.insert("day".to_string(), day.to_string());
                }
                None => errors.push(format!("Invalid day: {raw}")),
            },
            None => errors.push("Day is required".to_string()),
        }

        match row.text("period") {
            Some(raw) => {
                data.insert("period".to_string(), raw.to_string());
                if find_period(&ctx.snapshot.periods, raw).is_none() {
                    errors.push(format!("Unknown period: {raw}"));
                }
            }
            None => errors.push("Period is required".to_string()),
        }

        for (fld, kind) in [("class", "class"), ("subject", "subject"), ("teacher", "teacher")] {
            match row.text(fld) {
                Some(raw) => {
                    data.insert(fld.to_string(), raw.to_string());
                    let set = match fld {
                        "class" => &ctx.snapshot.classes,
                        "subject" => &ctx.snapshot.subjects,
                        _ => &ctx.snapshot.teachers,
                    };
                    resolve_or_report(set, raw, kind, |r| r.name.as_str(), &mut errors);
                }
                None => errors.push(format!("{} is required", capitalize(fld))),
            }
        }

        if let Some(raw) = row.text("room") {
            data.insert("room".to_string(), raw.to_string());
            resolve_or_report(
                &ctx.snapshot.rooms,
                raw,
                "room",
                |r| r.name.as_str(),
                &mut errors,
            );
        }

        // Lessons are always creates; duplicate detection is intentionally
        // not attempted for timetable rows.
        ValidatedRow::classify(row_index, data, errors, None)
    }

    fn commit_row(
        &self,
        tx: &Transaction,
        ctx: &ImportContext,
        row: &ValidatedRow,
    ) -> anyhow::Result<()> {
        let timetable_id = ctx
            .timetable_id
            .ok_or_else(|| anyhow!("timetable id missing at commit"))?;

        let period = find_period(&ctx.snapshot.periods, field(row, "period"))
            .ok_or_else(|| anyhow!("period disappeared during commit"))?;
        let class = find_by_name(&ctx.snapshot.classes, field(row, "class"), |c| {
            c.name.as_str()
        })
        .ok_or_else(|| anyhow!("class disappeared during commit"))?;
        let subject = find_by_name(&ctx.snapshot.subjects, field(row, "subject"), |s| {
            s.name.as_str()
        })
        .ok_or_else(|| anyhow!("subject disappeared during commit"))?;
        let teacher = find_by_name(&ctx.snapshot.teachers, field(row, "teacher"), |t| {
            t.name.as_str()
        })
        .ok_or_else(|| anyhow!("teacher disappeared during commit"))?;
        let room_id = match row.data.get("room") {
            Some(raw) => Some(
                find_by_name(&ctx.snapshot.rooms, raw, |r| r.name.as_str())
                    .map(|r| r.id.clone())
                    .ok_or_else(|| anyhow!("room disappeared during commit"))?,
            ),
            None => None,
        };

        tx.execute(
            "INSERT INTO lessons(id, school_id, timetable_id, day, period_id,
                 class_id, subject_id, teacher_id, room_id)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                ctx.school_id,
                timetable_id,
                field(row, "day"),
                &period.id,
                &class.id,
                &subject.id,
                &teacher.id,
                &room_id,
            ),
        )?;
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
