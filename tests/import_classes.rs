mod test_support;

use rusqlite::Connection;
use test_support::{run_import, setup_school, spawn_sidecar, temp_dir, workspace_db_path};

#[test]
fn class_rows_resolve_optional_grade_and_default_capacity() {
    let workspace = temp_dir("schoold-classes-basic");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "grades",
        "commit",
        "Grade,Level\nGrade 7,7\n",
    );

    let report = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "classes",
        "commit",
        "Name,Capacity,Grade\n7A,28,Grade 7\n7B,,grade 7\n8A,,Grade 8\n",
    );
    assert_eq!(report["total"].as_u64(), Some(3));
    assert_eq!(report["created"].as_u64(), Some(2));
    assert_eq!(report["skipped"].as_u64(), Some(1));
    assert_eq!(
        report["rows"][2]["errors"][0].as_str(),
        Some("Unknown grade: Grade 8")
    );

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let capacity: i64 = db
        .query_row("SELECT capacity FROM classes WHERE name = '7B'", [], |r| {
            r.get(0)
        })
        .expect("7B row");
    assert_eq!(capacity, 30, "blank capacity defaults to 30");
    let linked: i64 = db
        .query_row(
            "SELECT COUNT(*) FROM classes c JOIN grades g ON g.id = c.grade_id",
            [],
            |r| r.get(0),
        )
        .expect("count linked");
    assert_eq!(linked, 2, "both committed classes link to Grade 7");
}

#[test]
fn non_positive_capacity_is_a_row_error() {
    let workspace = temp_dir("schoold-classes-capacity");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let report = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "classes",
        "commit",
        "Name,Capacity\n9A,0\n9B,many\n",
    );
    assert_eq!(report["skipped"].as_u64(), Some(2));
    for row in report["rows"].as_array().expect("rows") {
        assert_eq!(row["status"].as_str(), Some("error"));
        assert_eq!(
            row["errors"][0].as_str(),
            Some("Capacity must be a positive number")
        );
    }
}

#[test]
fn class_reimport_updates_existing_row() {
    let workspace = temp_dir("schoold-classes-update");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "classes",
        "commit",
        "Name,Capacity\n7A,28\n",
    );
    let again = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "classes",
        "commit",
        "Name,Capacity\n7a,32\n",
    );
    assert_eq!(again["updated"].as_u64(), Some(1));

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let (count, capacity): (i64, i64) = db
        .query_row(
            "SELECT COUNT(*), MAX(capacity) FROM classes WHERE school_id = ?",
            [&school_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .expect("class row");
    assert_eq!(count, 1);
    assert_eq!(capacity, 32);
}
