use crate::db::{self, TeacherRecord};
use crate::ipc::helpers::{get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::preferences;
use serde_json::json;
use tracing::info;

fn teacher_json(t: &TeacherRecord) -> serde_json::Value {
    json!({
        "id": t.id,
        "name": t.name,
        "maxHoursWeek": t.max_hours_week,
        "preferences": t.preferences,
        "updatedAt": t.updated_at
    })
}

fn teachers_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let name = get_required_str(params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(HandlerErr::new("bad_params", "name must not be empty"));
    }
    let max_hours_week = match params.get("maxHoursWeek") {
        None | Some(serde_json::Value::Null) => 1,
        Some(v) => v
            .as_i64()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                HandlerErr::new("bad_params", "maxHoursWeek must be a positive integer")
            })?,
    };

    // Stored preferences are always in canonical form.
    let raw = params.get("preferences").cloned().unwrap_or(serde_json::Value::Null);
    let canonical = preferences::encode(&preferences::decode(&raw, &state.dimensions.day_names()));

    let teacher_id = db::teacher_insert(conn, &name, max_hours_week, &canonical).map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "teachers" }))
    })?;
    info!(teacher_id = %teacher_id, "teacher created");
    Ok(json!({
        "teacherId": teacher_id,
        "name": name,
        "maxHoursWeek": max_hours_week,
        "preferences": canonical
    }))
}

fn teachers_list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Ok(json!({ "teachers": [] }));
    };
    let teachers = db::teachers_list(conn)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    Ok(json!({
        "teachers": teachers.iter().map(teacher_json).collect::<Vec<_>>()
    }))
}

fn teachers_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let teacher_id = get_required_str(params, "teacherId")?;
    let deleted = db::teacher_delete(conn, &teacher_id)
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    if !deleted {
        return Err(HandlerErr::new("not_found", "teacher not found"));
    }
    if state
        .preferences
        .as_ref()
        .is_some_and(|s| s.teacher_id == teacher_id)
    {
        state.preferences = None;
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.create" => teachers_create(state, &req.params),
        "teachers.list" => teachers_list(state),
        "teachers.delete" => teachers_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
