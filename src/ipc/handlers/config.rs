use crate::db::{self, ConfigUpdate};
use crate::dimensions::{dimension_value, ConfigSnapshot, Dimension, DimensionStore};
use crate::ipc::helpers::{
    get_required_i64, get_required_str, require_db, respond, storage_err, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn config_view(store: &DimensionStore) -> serde_json::Value {
    json!({
        "classesPerDay": store.classes_per_day(),
        "daysPerWeek": store.days_per_week(),
        "hourNames": store.hour_names(),
        "dayIndices": store.day_indices(),
        "dayNames": store.day_names(),
        "suppressResize": store.is_resize_suppressed()
    })
}

/// Applies a backend response in two steps: commit the whole snapshot with
/// resizing suppressed, then flush so the resize sees the final dimensions.
fn apply_settled(store: &mut DimensionStore, snapshot: &ConfigSnapshot) -> Result<(), HandlerErr> {
    store.apply_snapshot(snapshot)?;
    store.flush();
    Ok(())
}

fn config_get(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let snapshot = db::config_get(conn).map_err(|e| storage_err("db_query_failed", e))?;
    apply_settled(&mut state.dimensions, &snapshot)?;
    Ok(config_view(&state.dimensions))
}

fn config_set_dimension(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind_raw = get_required_str(params, "kind")?;
    let kind = Dimension::parse(&kind_raw).ok_or_else(|| {
        HandlerErr::new(
            "bad_params",
            "kind must be one of: daysPerWeek, classesPerDay",
        )
    })?;
    let raw = params
        .get("value")
        .ok_or_else(|| HandlerErr::new("bad_params", "missing value"))?;
    let value = dimension_value(kind, raw)?;
    state.dimensions.set_dimension(kind, value)?;
    Ok(config_view(&state.dimensions))
}

fn config_set_hour_name(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_i64(params, "index")?;
    let name = get_required_str(params, "name")?;
    let index = usize::try_from(index)
        .map_err(|_| HandlerErr::new("bad_params", "index must not be negative"))?;
    state.dimensions.set_hour_name(index, name)?;
    Ok(config_view(&state.dimensions))
}

fn config_set_day_indices(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let items = params
        .get("dayIndices")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::new("bad_params", "dayIndices must be an array"))?;
    let indices = items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| HandlerErr::new("bad_params", "dayIndices must hold integers"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    state.dimensions.set_day_indices(&indices)?;
    Ok(config_view(&state.dimensions))
}

fn config_save(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let snapshot = state.dimensions.snapshot()?;
    let echoed = db::config_set(conn, &ConfigUpdate::from(&snapshot))
        .map_err(|e| storage_err("db_update_failed", e))?;
    apply_settled(&mut state.dimensions, &echoed)?;
    info!(
        classes_per_day = echoed.classes_per_day,
        days_per_week = echoed.days_per_week,
        "configuration saved from editor"
    );
    Ok(config_view(&state.dimensions))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "config.get" => config_get(state),
        "config.setDimension" => config_set_dimension(state, &req.params),
        "config.setHourName" => config_set_hour_name(state, &req.params),
        "config.setDayIndices" => config_set_day_indices(state, &req.params),
        "config.save" => config_save(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
