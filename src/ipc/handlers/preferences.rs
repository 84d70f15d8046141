use crate::db;
use crate::dimensions::DimensionStore;
use crate::ipc::helpers::{get_required_i64, get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, PreferenceSession, Request};
use crate::preferences::{self, PreferenceMatrix};
use serde_json::json;
use tracing::{debug, info};

fn no_session() -> HandlerErr {
    HandlerErr::new("no_session", "open a teacher's preferences first")
}

fn session(state: &AppState) -> Result<&PreferenceSession, HandlerErr> {
    state.preferences.as_ref().ok_or_else(no_session)
}

fn session_mut(state: &mut AppState) -> Result<&mut PreferenceSession, HandlerErr> {
    state
        .preferences
        .as_mut()
        .ok_or_else(no_session)
}

/// `effective` is the part of the payload the timetable solver will honour
/// under the current dimensions.
fn session_view(session: &PreferenceSession, store: &DimensionStore) -> serde_json::Value {
    let unresolved: Vec<&str> = session.matrix.unresolved().map(|(k, _)| k).collect();
    let effective = session
        .matrix
        .constraints_within(store.days_per_week(), store.classes_per_day());
    json!({
        "teacherId": session.teacher_id,
        "preferences": preferences::encode(&session.matrix),
        "effective": preferences::encode(&effective),
        "unresolvedKeys": unresolved
    })
}

/// The grid only offers cells inside the configured dimensions.
fn check_cell(store: &DimensionStore, day: i64, hour: i64) -> Result<(), HandlerErr> {
    if !(0..i64::from(store.days_per_week())).contains(&day) {
        return Err(HandlerErr::new("bad_params", "day out of range")
            .with_details(json!({ "daysPerWeek": store.days_per_week() })));
    }
    if !(0..i64::from(store.classes_per_day())).contains(&hour) {
        return Err(HandlerErr::new("bad_params", "hour out of range")
            .with_details(json!({ "classesPerDay": store.classes_per_day() })));
    }
    Ok(())
}

fn preferences_open(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let teacher_id = get_required_str(params, "teacherId")?;
    let record = db::teacher_get(conn, &teacher_id)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?
        .ok_or_else(|| HandlerErr::new("not_found", "teacher not found"))?;

    let matrix = preferences::decode(&record.preferences, &state.dimensions.day_names());
    let session = PreferenceSession {
        teacher_id: record.id,
        matrix,
    };
    let view = session_view(&session, &state.dimensions);
    state.preferences = Some(session);
    Ok(view)
}

fn preferences_toggle(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let day = get_required_i64(params, "day")?;
    let hour = get_required_i64(params, "hour")?;
    check_cell(&state.dimensions, day, hour)?;
    let session = session_mut(state)?;
    let status = session.matrix.toggle(day, hour);
    debug!(day, hour, status = status.as_str(), "cell toggled");
    Ok(json!({
        "day": day,
        "hour": hour,
        "status": status,
        "preferences": preferences::encode(&session.matrix)
    }))
}

fn preferences_status(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let day = get_required_i64(params, "day")?;
    let hour = get_required_i64(params, "hour")?;
    let session = session(state)?;
    Ok(json!({
        "day": day,
        "hour": hour,
        "status": session.matrix.status(day, hour)
    }))
}

fn grid_rows(store: &DimensionStore, matrix: &PreferenceMatrix) -> Vec<serde_json::Value> {
    let days = i64::from(store.days_per_week());
    store
        .hour_names()
        .iter()
        .enumerate()
        .map(|(hour, label)| {
            let hour = hour as i64;
            let cells: Vec<_> = (0..days).map(|day| matrix.status(day, hour)).collect();
            json!({
                "hour": hour,
                "label": label,
                "cells": cells
            })
        })
        .collect()
}

fn preferences_grid(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = &state.dimensions;
    let session = session(state)?;
    let days: Vec<_> = store
        .day_indices()
        .iter()
        .zip(store.day_names())
        .enumerate()
        .map(|(pos, (weekday, name))| {
            let day = pos as i64;
            json!({
                "day": day,
                "weekday": weekday,
                "name": name,
                "unavailable": session.matrix.unavailable(day),
                "preferred": session.matrix.preferred(day)
            })
        })
        .collect();
    Ok(json!({
        "teacherId": session.teacher_id,
        "days": days,
        "rows": grid_rows(store, &session.matrix)
    }))
}

fn preferences_save(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let session = session(state)?;
    let encoded = preferences::encode(&session.matrix);
    let updated = db::teacher_set_preferences(conn, &session.teacher_id, &encoded)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
    if !updated {
        return Err(HandlerErr::new("not_found", "teacher not found"));
    }
    info!(
        teacher_id = %session.teacher_id,
        constrained = !session.matrix.is_empty(),
        "preferences saved"
    );
    Ok(session_view(session, &state.dimensions))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "preferences.open" => preferences_open(state, &req.params),
        "preferences.toggle" => preferences_toggle(state, &req.params),
        "preferences.status" => preferences_status(state, &req.params),
        "preferences.grid" => preferences_grid(state),
        "preferences.save" => preferences_save(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
