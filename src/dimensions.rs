use crate::error::ValidationError;
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_DAYS_PER_WEEK: u32 = 5;
pub const DEFAULT_CLASSES_PER_DAY: u32 = 5;
pub const MAX_DAYS_PER_WEEK: i64 = 7;
pub const MAX_CLASSES_PER_DAY: i64 = 24;

/// Canonical weekday ids 0..=6. Day labels are selections from this table.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn weekday_name(day: u8) -> String {
    WEEKDAY_NAMES
        .get(day as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Day {}", day))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    DaysPerWeek,
    ClassesPerDay,
}

impl Dimension {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daysPerWeek" | "days_per_week" => Some(Self::DaysPerWeek),
            "classesPerDay" | "classes_per_day" => Some(Self::ClassesPerDay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DaysPerWeek => "daysPerWeek",
            Self::ClassesPerDay => "classesPerDay",
        }
    }
}

/// Configuration exchanged with storage. Empty arrays mean "not provided".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub classes_per_day: u32,
    pub days_per_week: u32,
    pub hour_names: Vec<String>,
    pub day_indices: Vec<u8>,
}

pub fn default_hour_name(i: usize) -> String {
    format!("Hour {}", i + 1)
}

pub fn default_day_index(i: usize) -> u8 {
    i as u8
}

/// Keeps the overlapping prefix, pads with `default_for(index)`, drops the tail.
pub fn resize_labels<T: Clone>(labels: &[T], n: usize, default_for: impl Fn(usize) -> T) -> Vec<T> {
    let mut out: Vec<T> = labels.iter().take(n).cloned().collect();
    out.extend((out.len()..n).map(default_for));
    out
}

pub fn validate_dimension(kind: Dimension, value: i64) -> Result<u32, ValidationError> {
    if value < 1 {
        return Err(ValidationError::NonPositive {
            kind: kind.as_str(),
            value: value.to_string(),
        });
    }
    match kind {
        Dimension::DaysPerWeek if value > MAX_DAYS_PER_WEEK => {
            Err(ValidationError::DaysPerWeekOutOfRange(value))
        }
        Dimension::ClassesPerDay if value > MAX_CLASSES_PER_DAY => {
            Err(ValidationError::ClassesPerDayOutOfRange(value))
        }
        // Both bounds are far below u32::MAX.
        _ => Ok(value as u32),
    }
}

/// Integers, integral floats and numeric strings are accepted.
pub fn dimension_value(kind: Dimension, v: &serde_json::Value) -> Result<i64, ValidationError> {
    let reject = || ValidationError::NonPositive {
        kind: kind.as_str(),
        value: v.to_string(),
    };
    if let Some(n) = v.as_i64() {
        return Ok(n);
    }
    let f = match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(reject)?;
    if !f.is_finite() || f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
        return Err(reject());
    }
    Ok(f as i64)
}

pub fn ensure_distinct_day_indices(indices: &[u8]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(indices.len());
    if indices.iter().all(|d| seen.insert(*d)) {
        Ok(())
    } else {
        Err(ValidationError::DuplicateDayIndices)
    }
}

/// After any resize `day_indices.len() == days_per_week` and
/// `hour_names.len() == classes_per_day`. No resize runs while
/// `suppress_resize` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionStore {
    days_per_week: u32,
    classes_per_day: u32,
    day_indices: Vec<u8>,
    hour_names: Vec<String>,
    suppress_resize: bool,
}

impl Default for DimensionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionStore {
    pub fn new() -> Self {
        Self {
            days_per_week: DEFAULT_DAYS_PER_WEEK,
            classes_per_day: DEFAULT_CLASSES_PER_DAY,
            day_indices: resize_labels(&[], DEFAULT_DAYS_PER_WEEK as usize, default_day_index),
            hour_names: resize_labels(&[], DEFAULT_CLASSES_PER_DAY as usize, default_hour_name),
            suppress_resize: false,
        }
    }

    pub fn days_per_week(&self) -> u32 {
        self.days_per_week
    }

    pub fn classes_per_day(&self) -> u32 {
        self.classes_per_day
    }

    pub fn day_indices(&self) -> &[u8] {
        &self.day_indices
    }

    pub fn hour_names(&self) -> &[String] {
        &self.hour_names
    }

    pub fn day_names(&self) -> Vec<String> {
        self.day_indices.iter().map(|d| weekday_name(*d)).collect()
    }

    pub fn is_resize_suppressed(&self) -> bool {
        self.suppress_resize
    }

    pub fn suppress_resize(&mut self) {
        self.suppress_resize = true;
    }

    pub fn set_dimension(&mut self, kind: Dimension, value: i64) -> Result<(), ValidationError> {
        let value = validate_dimension(kind, value)?;
        match kind {
            Dimension::DaysPerWeek => self.days_per_week = value,
            Dimension::ClassesPerDay => self.classes_per_day = value,
        }
        self.resize_effect();
        Ok(())
    }

    pub fn set_hour_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), ValidationError> {
        let classes_per_day = self.classes_per_day;
        let slot = self
            .hour_names
            .get_mut(index)
            .ok_or(ValidationError::HourIndexOutOfRange {
                index,
                classes_per_day,
            })?;
        *slot = name.into();
        Ok(())
    }

    /// Nothing changes unless every check passes.
    pub fn set_day_indices(&mut self, indices: &[i64]) -> Result<(), ValidationError> {
        if indices.len() != self.days_per_week as usize {
            return Err(ValidationError::LabelCountMismatch {
                expected: self.days_per_week as usize,
                actual: indices.len(),
            });
        }
        let mut next = Vec::with_capacity(indices.len());
        for &d in indices {
            if !(0..MAX_DAYS_PER_WEEK).contains(&d) {
                return Err(ValidationError::DayIndexOutOfRange(d));
            }
            next.push(d as u8);
        }
        ensure_distinct_day_indices(&next)?;
        self.day_indices = next;
        Ok(())
    }

    /// Commits a backend snapshot and leaves resizing suppressed.
    ///
    /// Call [`DimensionStore::flush`] once the snapshot is in place.
    pub fn apply_snapshot(&mut self, snapshot: &ConfigSnapshot) -> Result<(), ValidationError> {
        let days_per_week = validate_dimension(Dimension::DaysPerWeek, snapshot.days_per_week as i64)?;
        let classes_per_day =
            validate_dimension(Dimension::ClassesPerDay, snapshot.classes_per_day as i64)?;
        if let Some(&bad) = snapshot
            .day_indices
            .iter()
            .find(|d| i64::from(**d) >= MAX_DAYS_PER_WEEK)
        {
            return Err(ValidationError::DayIndexOutOfRange(bad as i64));
        }
        ensure_distinct_day_indices(&snapshot.day_indices)?;

        self.suppress_resize();
        self.days_per_week = days_per_week;
        self.classes_per_day = classes_per_day;
        self.hour_names = if snapshot.hour_names.is_empty() {
            resize_labels(&[], classes_per_day as usize, default_hour_name)
        } else {
            snapshot.hour_names.clone()
        };
        self.day_indices = if snapshot.day_indices.is_empty() {
            resize_labels(&[], days_per_week as usize, default_day_index)
        } else {
            snapshot.day_indices.clone()
        };
        Ok(())
    }

    pub fn flush(&mut self) {
        self.suppress_resize = false;
        self.resize_effect();
    }

    pub fn snapshot(&self) -> Result<ConfigSnapshot, ValidationError> {
        ensure_distinct_day_indices(&self.day_indices)?;
        Ok(ConfigSnapshot {
            classes_per_day: self.classes_per_day,
            days_per_week: self.days_per_week,
            hour_names: self.hour_names.clone(),
            day_indices: self.day_indices.clone(),
        })
    }

    fn resize_effect(&mut self) {
        if self.suppress_resize {
            debug!("label resize suppressed");
            return;
        }
        self.day_indices = resize_labels(
            &self.day_indices,
            self.days_per_week as usize,
            default_day_index,
        );
        self.hour_names = resize_labels(
            &self.hour_names,
            self.classes_per_day as usize,
            default_hour_name,
        );
    }
}
