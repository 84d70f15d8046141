use crate::db;
use crate::dimensions::DimensionStore;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "teacherOpen": state.preferences.as_ref().map(|s| s.teacher_id.clone())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            // A new workspace starts a new edit session.
            let mut dimensions = DimensionStore::new();
            // Best-effort: preload the stored configuration. This must not
            // prevent the workspace from opening.
            match db::config_get(&conn) {
                Ok(snapshot) => match dimensions.apply_snapshot(&snapshot) {
                    Ok(()) => dimensions.flush(),
                    Err(e) => warn!(error = %e, "stored configuration rejected; using defaults"),
                },
                Err(e) => warn!(error = %e, "could not preload configuration"),
            }

            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.dimensions = dimensions;
            state.preferences = None;
            info!(workspace = %path.display(), "workspace selected");
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
