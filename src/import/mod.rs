pub mod columns;
pub mod entities;
pub mod fields;
pub mod names;
pub mod snapshot;
pub mod store;
pub mod types;

use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::import::columns::{resolve_columns, RowView};
use crate::import::entities::importer_for;
use crate::import::snapshot::Snapshot;
use crate::import::types::{ImportError, ImportReport, RowStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Teachers,
    Subjects,
    Classes,
    Rooms,
    Timetable,
    Grades,
    Events,
}

impl EntityKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "teachers" => Some(EntityKind::Teachers),
            "subjects" => Some(EntityKind::Subjects),
            "classes" => Some(EntityKind::Classes),
            "rooms" => Some(EntityKind::Rooms),
            "timetable" => Some(EntityKind::Timetable),
            "grades" => Some(EntityKind::Grades),
            "events" => Some(EntityKind::Events),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Teachers => "teachers",
            EntityKind::Subjects => "subjects",
            EntityKind::Classes => "classes",
            EntityKind::Rooms => "rooms",
            EntityKind::Timetable => "timetable",
            EntityKind::Grades => "grades",
            EntityKind::Events => "events",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    Preview,
    Commit,
}

impl ImportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preview" => Some(ImportMode::Preview),
            "commit" => Some(ImportMode::Commit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportMode::Preview => "preview",
            ImportMode::Commit => "commit",
        }
    }
}

/// Per-request state handed to the importers: scope ids plus the reference
/// snapshot loaded at the start of the request.
pub struct ImportContext<'a> {
    pub school_id: &'a str,
    pub timetable_id: Option<&'a str>,
    pub snapshot: Snapshot,
}

pub struct ImportRequest<'a> {
    pub kind: EntityKind,
    pub school_id: &'a str,
    pub mode: ImportMode,
    pub csv_text: &'a str,
    pub timetable_id: Option<&'a str>,
}

/// Two-phase controller. Preview validates every row and returns the report
/// without touching the store. Commit runs the identical validation pass
/// against a fresh snapshot (preview output is never trusted; the store may
/// have changed in between), then writes all non-error rows in file order
/// inside a single transaction: a storage failure rolls the whole file back,
/// row-level validation errors only skip their row.
pub fn run(conn: &Connection, req: &ImportRequest) -> Result<ImportReport, ImportError> {
    if req.kind == EntityKind::Timetable && req.timetable_id.is_none() {
        return Err(ImportError::MissingTimetableId);
    }
    let school: Option<i64> = conn
        .query_row("SELECT 1 FROM schools WHERE id = ?", [req.school_id], |r| {
            r.get(0)
        })
        .optional()?;
    if school.is_none() {
        return Err(ImportError::UnknownSchool(req.school_id.to_string()));
    }

    let records = parse_csv(req.csv_text)?;
    if records.len() < 2 {
        return Err(ImportError::EmptyFile);
    }

    let importer = importer_for(req.kind);
    let map = resolve_columns(&records[0], importer.columns())?;
    let ctx = ImportContext {
        school_id: req.school_id,
        timetable_id: req.timetable_id,
        snapshot: snapshot::load(conn, req.school_id, req.kind)?,
    };

    let mut rows = Vec::with_capacity(records.len() - 1);
    for (i, cells) in records[1..].iter().enumerate() {
        let view = RowView::new(cells, &map);
        rows.push(importer.validate(&ctx, i + 1, &view));
    }

    let total = rows.len();
    let skipped = rows.iter().filter(|r| r.status == RowStatus::Error).count();
    info!(
        kind = req.kind.as_str(),
        mode = req.mode.as_str(),
        total,
        errors = skipped,
        "import validated"
    );

    if req.mode == ImportMode::Preview {
        return Ok(ImportReport {
            total,
            rows,
            created: None,
            updated: None,
            skipped: None,
        });
    }

    let tx = conn.unchecked_transaction()?;
    if let Err(e) = importer.commit_rows(&tx, &ctx, &rows) {
        // Dropping the transaction rolls back every write of this file.
        return Err(ImportError::Commit(e.to_string()));
    }
    tx.commit()?;

    let created = rows.iter().filter(|r| r.status == RowStatus::Ok).count();
    let updated = rows
        .iter()
        .filter(|r| r.status == RowStatus::Update)
        .count();
    if skipped > 0 {
        warn!(kind = req.kind.as_str(), skipped, "rows skipped during commit");
    }
    info!(
        kind = req.kind.as_str(),
        created, updated, skipped, "import committed"
    );

    Ok(ImportReport {
        total,
        rows,
        created: Some(created),
        updated: Some(updated),
        skipped: Some(skipped),
    })
}

fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Csv(e.to_string()))?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        out.push(cells);
    }
    Ok(out)
}
