pub mod classes;
pub mod events;
pub mod grades;
pub mod lessons;
pub mod rooms;
pub mod subjects;
pub mod teachers;

use rusqlite::Transaction;

use crate::import::columns::{ColumnSpec, RowView};
use crate::import::types::{RowStatus, ValidatedRow};
use crate::import::{EntityKind, ImportContext};

/// One importer per entity type, all exposing the same validate/commit
/// contract; adding an entity type means adding a module here plus a
/// registry arm, nothing else.
pub trait EntityImporter: Sync {
    fn columns(&self) -> &'static [ColumnSpec];

    fn validate(&self, ctx: &ImportContext, row_index: usize, row: &RowView) -> ValidatedRow;

    fn commit_row(
        &self,
        tx: &Transaction,
        ctx: &ImportContext,
        row: &ValidatedRow,
    ) -> anyhow::Result<()>;

    /// Commit pass over the whole validated set, in file order. Error rows
    /// are skipped, everything else is written. Grades override this to
    /// fold curriculum rows into per-grade groups first.
    fn commit_rows(
        &self,
        tx: &Transaction,
        ctx: &ImportContext,
        rows: &[ValidatedRow],
    ) -> anyhow::Result<()> {
        for row in rows.iter().filter(|r| r.status != RowStatus::Error) {
            self.commit_row(tx, ctx, row)?;
        }
        Ok(())
    }
}

pub fn importer_for(kind: EntityKind) -> &'static dyn EntityImporter {
    match kind {
        EntityKind::Teachers => &teachers::TeacherImporter,
        EntityKind::Subjects => &subjects::SubjectImporter,
        EntityKind::Classes => &classes::ClassImporter,
        EntityKind::Rooms => &rooms::RoomImporter,
        EntityKind::Timetable => &lessons::LessonImporter,
        EntityKind::Grades => &grades::GradeImporter,
        EntityKind::Events => &events::EventImporter,
    }
}

/// Validated field access for commit paths; validation guarantees presence
/// for everything a commit reads.
pub(crate) fn field<'a>(row: &'a ValidatedRow, key: &str) -> &'a str {
    row.data.get(key).map(String::as_str).unwrap_or("")
}
