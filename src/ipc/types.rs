use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::dimensions::DimensionStore;
use crate::preferences::PreferenceMatrix;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The matrix being edited for one teacher. Replaced on every open.
pub struct PreferenceSession {
    pub teacher_id: String,
    pub matrix: PreferenceMatrix,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub dimensions: DimensionStore,
    pub preferences: Option<PreferenceSession>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            dimensions: DimensionStore::new(),
            preferences: None,
        }
    }
}
