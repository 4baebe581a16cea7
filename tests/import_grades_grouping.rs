mod test_support;

use rusqlite::Connection;
use test_support::{run_import, setup_school, spawn_sidecar, temp_dir, workspace_db_path};

#[test]
fn rows_for_one_grade_become_one_grade_and_many_links() {
    let workspace = temp_dir("schoold-grades-grouping");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "subjects",
        "commit",
        "Name,Category\nMath,Sciences\nPhysics,Sciences\n",
    );

    let report = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "grades",
        "commit",
        "Grade,Level,Subject,Hours per week\nGrade 7,7,Math,4\nGrade 7,7,Physics,3\n",
    );
    assert_eq!(report["total"].as_u64(), Some(2));
    assert_eq!(
        report["created"].as_u64().unwrap()
            + report["updated"].as_u64().unwrap()
            + report["skipped"].as_u64().unwrap(),
        2
    );

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let grades: i64 = db
        .query_row("SELECT COUNT(*) FROM grades", [], |r| r.get(0))
        .expect("count grades");
    assert_eq!(grades, 1, "same grade name must not create duplicates");
    let links: i64 = db
        .query_row("SELECT COUNT(*) FROM grade_curriculum", [], |r| r.get(0))
        .expect("count links");
    assert_eq!(links, 2);
}

#[test]
fn reimport_replaces_curriculum_and_updates_level() {
    let workspace = temp_dir("schoold-grades-replace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "subjects",
        "commit",
        "Name,Category\nMath,Sciences\nPhysics,Sciences\n",
    );
    let _ = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "grades",
        "commit",
        "Grade,Level,Subject,Hours per week\nGrade 7,7,Math,4\nGrade 7,7,Physics,3\n",
    );

    // Physics dropped, Math hours changed, level bumped.
    let report = run_import(
        &mut stdin,
        &mut reader,
        "3",
        &school_id,
        "grades",
        "commit",
        "Grade,Level,Subject,Hours per week\nGrade 7,8,Math,5\n",
    );
    assert_eq!(report["rows"][0]["status"].as_str(), Some("update"));
    assert_eq!(report["updated"].as_u64(), Some(1));

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let (grades, level): (i64, i64) = db
        .query_row("SELECT COUNT(*), MAX(level) FROM grades", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .expect("grade row");
    assert_eq!(grades, 1);
    assert_eq!(level, 8);
    let links: Vec<(String, i64)> = db
        .prepare(
            "SELECT s.name, gc.hours_per_week FROM grade_curriculum gc
             JOIN subjects s ON s.id = gc.subject_id",
        )
        .expect("prepare")
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("collect");
    assert_eq!(
        links,
        vec![("Math".to_string(), 5)],
        "curriculum is replaced, never merged"
    );
}

#[test]
fn repeated_subject_in_one_file_is_last_write_wins() {
    let workspace = temp_dir("schoold-grades-lastwrite");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "subjects",
        "commit",
        "Name,Category\nMath,Sciences\n",
    );
    let _ = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "grades",
        "commit",
        "Grade,Subject,Hours per week\nGrade 7,Math,4\nGrade 7,MATH,6\n",
    );

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let hours: i64 = db
        .query_row("SELECT hours_per_week FROM grade_curriculum", [], |r| {
            r.get(0)
        })
        .expect("link row");
    assert_eq!(hours, 6);
}

#[test]
fn hours_out_of_range_skip_only_that_row() {
    let workspace = temp_dir("schoold-grades-hours");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let school_id = setup_school(&mut stdin, &mut reader, &workspace);

    let _ = run_import(
        &mut stdin,
        &mut reader,
        "1",
        &school_id,
        "subjects",
        "commit",
        "Name,Category\nMath,Sciences\nPhysics,Sciences\n",
    );
    let report = run_import(
        &mut stdin,
        &mut reader,
        "2",
        &school_id,
        "grades",
        "commit",
        "Grade,Subject,Hours per week\nGrade 7,Math,25\nGrade 7,Physics,3\n",
    );
    assert_eq!(report["skipped"].as_u64(), Some(1));
    assert_eq!(
        report["rows"][0]["errors"][0].as_str(),
        Some("Hours per week must be between 1 and 20")
    );

    let db = Connection::open(workspace_db_path(&workspace)).expect("open db");
    let links: i64 = db
        .query_row("SELECT COUNT(*) FROM grade_curriculum", [], |r| r.get(0))
        .expect("count links");
    assert_eq!(links, 1, "only the valid row contributes a link");
}
