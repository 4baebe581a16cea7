use crate::import::{self, EntityKind, ImportMode, ImportRequest};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

fn handle_import_run(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let kind_raw = match required_str(req, "type") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(kind) = EntityKind::parse(kind_raw) else {
        return err(
            &req.id,
            "bad_params",
            "type must be one of: teachers, subjects, classes, rooms, timetable, grades, events",
            None,
        );
    };
    let school_id = match required_str(req, "schoolId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let csv_text = match req.params.get("file").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing file", None),
    };
    let mode = match req.params.get("mode").and_then(|v| v.as_str()) {
        Some(raw) => match ImportMode::parse(raw) {
            Some(m) => m,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "mode must be one of: preview, commit",
                    None,
                )
            }
        },
        None => ImportMode::Preview,
    };
    let timetable_id = req
        .params
        .get("timetableId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let request = ImportRequest {
        kind,
        school_id,
        mode,
        csv_text,
        timetable_id,
    };
    match import::run(conn, &request) {
        Ok(report) => ok(
            &req.id,
            serde_json::to_value(&report).unwrap_or_else(|_| json!({})),
        ),
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.run" => Some(handle_import_run(state, req)),
        _ => None,
    }
}
