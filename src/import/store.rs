use rusqlite::Transaction;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix_string() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

/// Replacement semantics for a teacher's taught subjects: the incoming list
/// fully replaces the stored links, never merges with them. Runs inside the
/// commit transaction, so no empty-association window is visible.
pub fn replace_teacher_subjects(
    tx: &Transaction,
    teacher_id: &str,
    subject_ids: &[String],
) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM teacher_subjects WHERE teacher_id = ?",
        [teacher_id],
    )?;
    for subject_id in subject_ids {
        tx.execute(
            "INSERT OR REPLACE INTO teacher_subjects(teacher_id, subject_id) VALUES(?, ?)",
            (teacher_id, subject_id),
        )?;
    }
    Ok(())
}

/// Same replacement contract for a grade's curriculum links, with weekly
/// hours carried per subject.
pub fn replace_grade_curriculum(
    tx: &Transaction,
    grade_id: &str,
    subject_hours: &[(String, i64)],
) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM grade_curriculum WHERE grade_id = ?",
        [grade_id],
    )?;
    for (subject_id, hours) in subject_hours {
        tx.execute(
            "INSERT OR REPLACE INTO grade_curriculum(grade_id, subject_id, hours_per_week)
             VALUES(?, ?, ?)",
            (grade_id, subject_id, hours),
        )?;
    }
    Ok(())
}
