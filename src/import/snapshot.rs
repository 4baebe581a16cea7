use rusqlite::Connection;

use crate::import::EntityKind;

#[derive(Clone, Debug)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct GradeRef {
    pub id: String,
    pub name: String,
    pub level: i64,
}

#[derive(Clone, Debug)]
pub struct PeriodRef {
    pub id: String,
    pub label: String,
    pub number: i64,
}

#[derive(Clone, Debug)]
pub struct EventRef {
    pub id: String,
    pub title: String,
    pub start_date: String,
}

/// Reference sets loaded once at the start of a request and held immutable
/// for its duration. Not isolated from concurrent writers; commit re-runs
/// validation against a fresh snapshot instead of trusting preview output.
#[derive(Default)]
pub struct Snapshot {
    pub teachers: Vec<NamedRef>,
    pub subjects: Vec<NamedRef>,
    pub classes: Vec<NamedRef>,
    pub rooms: Vec<NamedRef>,
    pub grades: Vec<GradeRef>,
    pub periods: Vec<PeriodRef>,
    pub events: Vec<EventRef>,
}

fn named_refs(conn: &Connection, sql: &str, school_id: &str) -> rusqlite::Result<Vec<NamedRef>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([school_id], |row| {
        Ok(NamedRef {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Loads only the sets the selected entity kind resolves against.
pub fn load(conn: &Connection, school_id: &str, kind: EntityKind) -> rusqlite::Result<Snapshot> {
    let mut snap = Snapshot::default();

    let teachers = "SELECT id, name FROM teachers WHERE school_id = ? ORDER BY rowid";
    let subjects = "SELECT id, name FROM subjects WHERE school_id = ? ORDER BY rowid";
    let classes = "SELECT id, name FROM classes WHERE school_id = ? ORDER BY rowid";
    let rooms = "SELECT id, name FROM rooms WHERE school_id = ? ORDER BY rowid";

    match kind {
        EntityKind::Teachers => {
            snap.teachers = named_refs(conn, teachers, school_id)?;
            snap.subjects = named_refs(conn, subjects, school_id)?;
        }
        EntityKind::Subjects => {
            snap.subjects = named_refs(conn, subjects, school_id)?;
        }
        EntityKind::Classes => {
            snap.classes = named_refs(conn, classes, school_id)?;
            snap.grades = load_grades(conn, school_id)?;
        }
        EntityKind::Rooms => {
            snap.rooms = named_refs(conn, rooms, school_id)?;
        }
        EntityKind::Timetable => {
            snap.teachers = named_refs(conn, teachers, school_id)?;
            snap.subjects = named_refs(conn, subjects, school_id)?;
            snap.classes = named_refs(conn, classes, school_id)?;
            snap.rooms = named_refs(conn, rooms, school_id)?;
            snap.periods = load_periods(conn, school_id)?;
        }
        EntityKind::Grades => {
            snap.grades = load_grades(conn, school_id)?;
            snap.subjects = named_refs(conn, subjects, school_id)?;
        }
        EntityKind::Events => {
            snap.events = load_events(conn, school_id)?;
        }
    }

    Ok(snap)
}

fn load_grades(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<GradeRef>> {
    let mut stmt =
        conn.prepare("SELECT id, name, level FROM grades WHERE school_id = ? ORDER BY rowid")?;
    let rows = stmt.query_map([school_id], |row| {
        Ok(GradeRef {
            id: row.get(0)?,
            name: row.get(1)?,
            level: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn load_periods(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<PeriodRef>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, sort_order FROM periods WHERE school_id = ? ORDER BY sort_order",
    )?;
    let rows = stmt.query_map([school_id], |row| {
        Ok(PeriodRef {
            id: row.get(0)?,
            label: row.get(1)?,
            number: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn load_events(conn: &Connection, school_id: &str) -> rusqlite::Result<Vec<EventRef>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, start_date FROM events WHERE school_id = ? ORDER BY rowid",
    )?;
    let rows = stmt.query_map([school_id], |row| {
        Ok(EventRef {
            id: row.get(0)?,
            title: row.get(1)?,
            start_date: row.get(2)?,
        })
    })?;
    rows.collect()
}
