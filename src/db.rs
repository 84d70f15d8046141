use crate::dimensions::{
    default_day_index, default_hour_name, ensure_distinct_day_indices, resize_labels,
    validate_dimension, ConfigSnapshot, Dimension, DEFAULT_CLASSES_PER_DAY, DEFAULT_DAYS_PER_WEEK,
    MAX_CLASSES_PER_DAY, MAX_DAYS_PER_WEEK,
};
use crate::error::ValidationError;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_HOUR_NAMES: [&str; 5] = ["9:00", "10:00", "11:00", "12:00", "13:00"];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("timetable.sqlite3");
    let conn = Connection::open(&db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    info!(path = %db_path.display(), "workspace database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS config(
            id INTEGER PRIMARY KEY CHECK (id = 1),
            classes_per_day INTEGER NOT NULL,
            days_per_week INTEGER NOT NULL,
            hour_names TEXT NOT NULL,
            day_indices TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            max_hours_week INTEGER NOT NULL,
            preferences TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_name ON teachers(name)",
        [],
    )?;
    Ok(())
}

fn stored_hour_name(i: usize) -> String {
    DEFAULT_HOUR_NAMES
        .get(i)
        .map(|s| s.to_string())
        .unwrap_or_else(|| default_hour_name(i))
}

pub fn normalize_config(
    classes_per_day: u32,
    days_per_week: u32,
    hour_names: &[String],
    day_indices: &[u8],
) -> ConfigSnapshot {
    ConfigSnapshot {
        classes_per_day,
        days_per_week,
        hour_names: resize_labels(hour_names, classes_per_day as usize, stored_hour_name),
        day_indices: resize_labels(day_indices, days_per_week as usize, default_day_index),
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn read_config_row(conn: &Connection) -> anyhow::Result<Option<ConfigSnapshot>> {
    let row: Option<(i64, i64, String, String)> = conn
        .query_row(
            "SELECT classes_per_day, days_per_week, hour_names, day_indices FROM config WHERE id = 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?;
    let Some((classes_per_day, days_per_week, hour_names_json, day_indices_json)) = row else {
        return Ok(None);
    };
    let hour_names: Vec<String> = serde_json::from_str(&hour_names_json).unwrap_or_else(|e| {
        warn!(error = %e, "stored hour_names unreadable; using defaults");
        Vec::new()
    });
    let day_indices: Vec<u8> = serde_json::from_str(&day_indices_json).unwrap_or_else(|e| {
        warn!(error = %e, "stored day_indices unreadable; using defaults");
        Vec::new()
    });
    Ok(Some(ConfigSnapshot {
        classes_per_day: u32::try_from(classes_per_day)
            .unwrap_or(DEFAULT_CLASSES_PER_DAY)
            .clamp(1, MAX_CLASSES_PER_DAY as u32),
        days_per_week: u32::try_from(days_per_week)
            .unwrap_or(DEFAULT_DAYS_PER_WEEK)
            .clamp(1, MAX_DAYS_PER_WEEK as u32),
        hour_names,
        day_indices,
    }))
}

fn write_config_row(conn: &Connection, cfg: &ConfigSnapshot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO config(id, classes_per_day, days_per_week, hour_names, day_indices, updated_at)
         VALUES(1, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           classes_per_day = excluded.classes_per_day,
           days_per_week = excluded.days_per_week,
           hour_names = excluded.hour_names,
           day_indices = excluded.day_indices,
           updated_at = excluded.updated_at",
        (
            cfg.classes_per_day,
            cfg.days_per_week,
            serde_json::to_string(&cfg.hour_names)?,
            serde_json::to_string(&cfg.day_indices)?,
            now_rfc3339(),
        ),
    )?;
    Ok(())
}

pub fn config_get(conn: &Connection) -> anyhow::Result<ConfigSnapshot> {
    if let Some(stored) = read_config_row(conn)? {
        return Ok(normalize_config(
            stored.classes_per_day,
            stored.days_per_week,
            &stored.hour_names,
            &stored.day_indices,
        ));
    }
    let hour_names: Vec<String> = DEFAULT_HOUR_NAMES.iter().map(|s| s.to_string()).collect();
    let created = normalize_config(
        DEFAULT_CLASSES_PER_DAY,
        DEFAULT_DAYS_PER_WEEK,
        &hour_names,
        &[],
    );
    write_config_row(conn, &created)?;
    info!("created default schedule configuration");
    Ok(created)
}

// Absent arrays keep what is stored.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub classes_per_day: i64,
    pub days_per_week: i64,
    pub hour_names: Option<Vec<String>>,
    pub day_indices: Option<Vec<i64>>,
}

impl From<&ConfigSnapshot> for ConfigUpdate {
    fn from(s: &ConfigSnapshot) -> Self {
        Self {
            classes_per_day: i64::from(s.classes_per_day),
            days_per_week: i64::from(s.days_per_week),
            hour_names: Some(s.hour_names.clone()),
            day_indices: Some(s.day_indices.iter().map(|d| i64::from(*d)).collect()),
        }
    }
}

/// Validation failures come back as [`ValidationError`] inside the
/// `anyhow::Error`, and nothing is written.
pub fn config_set(conn: &Connection, update: &ConfigUpdate) -> anyhow::Result<ConfigSnapshot> {
    let classes_per_day = validate_dimension(Dimension::ClassesPerDay, update.classes_per_day)?;
    let days_per_week = validate_dimension(Dimension::DaysPerWeek, update.days_per_week)?;

    let requested_days = match &update.day_indices {
        Some(raw) => {
            let mut days = Vec::with_capacity(raw.len());
            for &d in raw {
                if !(0..MAX_DAYS_PER_WEEK).contains(&d) {
                    return Err(ValidationError::DayIndexOutOfRange(d).into());
                }
                days.push(d as u8);
            }
            ensure_distinct_day_indices(&days)?;
            Some(days)
        }
        None => None,
    };

    let stored = read_config_row(conn)?;
    let hour_names = match &update.hour_names {
        Some(v) => v.clone(),
        None => stored.as_ref().map(|s| s.hour_names.clone()).unwrap_or_default(),
    };
    let day_indices = match requested_days {
        Some(v) => v,
        None => stored.map(|s| s.day_indices).unwrap_or_default(),
    };

    let cfg = normalize_config(classes_per_day, days_per_week, &hour_names, &day_indices);
    ensure_distinct_day_indices(&cfg.day_indices)?;
    write_config_row(conn, &cfg)?;
    info!(
        classes_per_day = cfg.classes_per_day,
        days_per_week = cfg.days_per_week,
        "schedule configuration saved"
    );
    Ok(cfg)
}

#[derive(Debug, Clone)]
pub struct TeacherRecord {
    pub id: String,
    pub name: String,
    pub max_hours_week: i64,
    pub preferences: Value,
    pub updated_at: Option<String>,
}

fn parse_stored_preferences(id: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(teacher_id = id, error = %e, "stored preferences are not JSON; ignoring");
        Value::Null
    })
}

fn teacher_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<TeacherRecord> {
    let id: String = r.get(0)?;
    let raw: String = r.get(3)?;
    let preferences = parse_stored_preferences(&id, &raw);
    Ok(TeacherRecord {
        id,
        name: r.get(1)?,
        max_hours_week: r.get(2)?,
        preferences,
        updated_at: r.get(4)?,
    })
}

pub fn teacher_insert(
    conn: &Connection,
    name: &str,
    max_hours_week: i64,
    preferences: &Value,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO teachers(id, name, max_hours_week, preferences, updated_at)
         VALUES(?, ?, ?, ?, ?)",
        (
            &id,
            name,
            max_hours_week,
            serde_json::to_string(preferences)?,
            now_rfc3339(),
        ),
    )?;
    Ok(id)
}

pub fn teachers_list(conn: &Connection) -> anyhow::Result<Vec<TeacherRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, max_hours_week, preferences, updated_at
         FROM teachers
         ORDER BY name, id",
    )?;
    let rows = stmt
        .query_map([], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn teacher_get(conn: &Connection, teacher_id: &str) -> anyhow::Result<Option<TeacherRecord>> {
    let rec = conn
        .query_row(
            "SELECT id, name, max_hours_week, preferences, updated_at
             FROM teachers WHERE id = ?",
            [teacher_id],
            teacher_from_row,
        )
        .optional()?;
    Ok(rec)
}

/// Returns false when no such teacher exists.
pub fn teacher_set_preferences(
    conn: &Connection,
    teacher_id: &str,
    preferences: &Value,
) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE teachers SET preferences = ?, updated_at = ? WHERE id = ?",
        (serde_json::to_string(preferences)?, now_rfc3339(), teacher_id),
    )?;
    Ok(changed > 0)
}

pub fn teacher_delete(conn: &Connection, teacher_id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM teachers WHERE id = ?", [teacher_id])?;
    Ok(changed > 0)
}
