mod test_support;

use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

fn open_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    prefix: &str,
) {
    let workspace = temp_dir(prefix);
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(stdin, reader, "cfg", "config.get", json!({}));
}

fn create_teacher(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    preferences: serde_json::Value,
) -> (String, serde_json::Value) {
    let created = request_ok(
        stdin,
        reader,
        "create",
        "teachers.create",
        json!({ "name": "Grace", "maxHoursWeek": 18, "preferences": preferences }),
    );
    let id = created
        .get("teacherId")
        .and_then(|v| v.as_str())
        .expect("teacherId")
        .to_string();
    (id, created["preferences"].clone())
}

#[test]
fn legacy_and_named_keys_are_stored_canonically() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workspace(&mut stdin, &mut reader, "timetabled-prefs-canonical");

    let (_, stored) = create_teacher(
        &mut stdin,
        &mut reader,
        json!({
            "0": [2, 1],
            "Wednesday": { "preferred": [4] },
            "3": { "unavailable": [], "preferred": [] }
        }),
    );
    assert_eq!(
        stored,
        json!({
            "0": { "unavailable": [1, 2], "preferred": [] },
            "2": { "unavailable": [], "preferred": [4] }
        })
    );

    let listed = request_ok(&mut stdin, &mut reader, "list", "teachers.list", json!({}));
    assert_eq!(listed["teachers"][0]["preferences"], stored);
    assert_eq!(listed["teachers"][0]["maxHoursWeek"], json!(18));
}

#[test]
fn toggle_cycles_and_saves_sparse_payload() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workspace(&mut stdin, &mut reader, "timetabled-prefs-toggle");
    let (teacher_id, _) = create_teacher(&mut stdin, &mut reader, json!(null));

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "open",
        "preferences.open",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(opened["preferences"], json!({}));

    let cell = json!({ "day": 1, "hour": 2 });
    let first = request_ok(&mut stdin, &mut reader, "t1", "preferences.toggle", cell.clone());
    assert_eq!(first["status"], json!("unavailable"));
    assert_eq!(
        first["preferences"],
        json!({ "1": { "unavailable": [2], "preferred": [] } })
    );

    let second = request_ok(&mut stdin, &mut reader, "t2", "preferences.toggle", cell.clone());
    assert_eq!(second["status"], json!("preferred"));
    let status = request_ok(&mut stdin, &mut reader, "s", "preferences.status", cell.clone());
    assert_eq!(status["status"], json!("preferred"));

    let third = request_ok(&mut stdin, &mut reader, "t3", "preferences.toggle", cell.clone());
    assert_eq!(third["status"], json!("available"));
    assert_eq!(third["preferences"], json!({}));

    let _ = request_ok(&mut stdin, &mut reader, "t4", "preferences.toggle", json!({ "day": 4, "hour": 0 }));
    let saved = request_ok(&mut stdin, &mut reader, "save", "preferences.save", json!({}));
    assert_eq!(
        saved["preferences"],
        json!({ "4": { "unavailable": [0], "preferred": [] } })
    );

    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "reopen",
        "preferences.open",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(reopened["preferences"], saved["preferences"]);
}

#[test]
fn grid_callers_are_bounded_by_dimensions() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workspace(&mut stdin, &mut reader, "timetabled-prefs-grid");
    let (teacher_id, _) = create_teacher(
        &mut stdin,
        &mut reader,
        json!({ "1": { "unavailable": [0], "preferred": [3] }, "Holiday": [1] }),
    );
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "open",
        "preferences.open",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(opened["unresolvedKeys"], json!(["Holiday"]));
    assert!(opened["effective"].get("Holiday").is_none());
    assert_eq!(opened["effective"]["1"]["preferred"], json!([3]));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "far",
        "preferences.toggle",
        json!({ "day": 0, "hour": 5 }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    let e = request_err(
        &mut stdin,
        &mut reader,
        "neg",
        "preferences.toggle",
        json!({ "day": -1, "hour": 0 }),
    );
    assert_eq!(e["code"], json!("bad_params"));

    // Lookups themselves accept any cell.
    let off = request_ok(
        &mut stdin,
        &mut reader,
        "off",
        "preferences.status",
        json!({ "day": 40, "hour": 40 }),
    );
    assert_eq!(off["status"], json!("available"));

    let grid = request_ok(&mut stdin, &mut reader, "grid", "preferences.grid", json!({}));
    let rows = grid["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["label"], json!("9:00"));
    assert_eq!(rows[0]["cells"][1], json!("unavailable"));
    assert_eq!(rows[3]["cells"][1], json!("preferred"));
    assert_eq!(rows[3]["cells"][0], json!("available"));
    assert_eq!(grid["days"][1]["name"], json!("Tuesday"));

    let saved = request_ok(&mut stdin, &mut reader, "save", "preferences.save", json!({}));
    assert_eq!(
        saved["preferences"]["Holiday"],
        json!({ "unavailable": [1], "preferred": [] })
    );
}

#[test]
fn deleting_the_open_teacher_closes_the_session() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workspace(&mut stdin, &mut reader, "timetabled-prefs-delete");
    let (teacher_id, _) = create_teacher(&mut stdin, &mut reader, json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "open",
        "preferences.open",
        json!({ "teacherId": teacher_id }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "del",
        "teachers.delete",
        json!({ "teacherId": teacher_id }),
    );
    let e = request_err(&mut stdin, &mut reader, "save", "preferences.save", json!({}));
    assert_eq!(e["code"], json!("no_session"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "again",
        "teachers.delete",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(e["code"], json!("not_found"));
    let e = request_err(
        &mut stdin,
        &mut reader,
        "open2",
        "preferences.open",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(e["code"], json!("not_found"));
}
