use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Tri-state classification of one (day, hour) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Unavailable,
    Preferred,
}

impl SlotStatus {
    pub fn next(self) -> Self {
        match self {
            Self::Available => Self::Unavailable,
            Self::Unavailable => Self::Preferred,
            Self::Preferred => Self::Available,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Preferred => "preferred",
        }
    }
}

/// Constraints for a single day. The two sets never share an hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceEntry {
    pub unavailable: BTreeSet<i64>,
    pub preferred: BTreeSet<i64>,
}

impl PreferenceEntry {
    pub fn is_empty(&self) -> bool {
        self.unavailable.is_empty() && self.preferred.is_empty()
    }

    pub fn status(&self, hour: i64) -> SlotStatus {
        if self.unavailable.contains(&hour) {
            SlotStatus::Unavailable
        } else if self.preferred.contains(&hour) {
            SlotStatus::Preferred
        } else {
            SlotStatus::Available
        }
    }

    fn retain_hours(&self, hours: i64) -> Self {
        let in_range = |h: &&i64| (0..hours).contains(*h);
        Self {
            unavailable: self.unavailable.iter().filter(in_range).copied().collect(),
            preferred: self.preferred.iter().filter(in_range).copied().collect(),
        }
    }
}

/// Only days with at least one constrained hour are stored. `unresolved`
/// holds entries whose day key had no index; they cannot be toggled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceMatrix {
    days: BTreeMap<i64, PreferenceEntry>,
    unresolved: BTreeMap<String, PreferenceEntry>,
}

impl PreferenceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.unresolved.is_empty()
    }

    pub fn day(&self, day: i64) -> Option<&PreferenceEntry> {
        self.days.get(&day)
    }

    pub fn days(&self) -> impl Iterator<Item = (i64, &PreferenceEntry)> + '_ {
        self.days.iter().map(|(d, e)| (*d, e))
    }

    pub fn unresolved(&self) -> impl Iterator<Item = (&str, &PreferenceEntry)> + '_ {
        self.unresolved.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn status(&self, day: i64, hour: i64) -> SlotStatus {
        self.day(day)
            .map(|e| e.status(hour))
            .unwrap_or(SlotStatus::Available)
    }

    pub fn unavailable(&self, day: i64) -> Vec<i64> {
        self.day(day)
            .map(|e| e.unavailable.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn preferred(&self, day: i64) -> Vec<i64> {
        self.day(day)
            .map(|e| e.preferred.iter().copied().collect())
            .unwrap_or_default()
    }

    // Any integer day/hour is accepted; range checks belong to the grid.
    pub fn toggle(&mut self, day: i64, hour: i64) -> SlotStatus {
        let entry = self.days.entry(day).or_default();
        let next = entry.status(hour).next();
        match next {
            SlotStatus::Unavailable => {
                entry.preferred.remove(&hour);
                entry.unavailable.insert(hour);
            }
            SlotStatus::Preferred => {
                entry.unavailable.remove(&hour);
                entry.preferred.insert(hour);
            }
            SlotStatus::Available => {
                entry.unavailable.remove(&hour);
                entry.preferred.remove(&hour);
            }
        }
        if entry.is_empty() {
            self.days.remove(&day);
        }
        next
    }

    /// Copy limited to `[0, days) x [0, hours)`, without unresolved keys.
    pub fn constraints_within(&self, days: u32, hours: u32) -> Self {
        let days = i64::from(days);
        let hours = i64::from(hours);
        let kept = self
            .days
            .iter()
            .filter(|(d, _)| (0..days).contains(*d))
            .map(|(d, e)| (*d, e.retain_hours(hours)))
            .filter(|(_, e)| !e.is_empty())
            .collect();
        Self {
            days: kept,
            unresolved: BTreeMap::new(),
        }
    }

    pub(super) fn put_day(&mut self, day: i64, mut entry: PreferenceEntry) -> Option<PreferenceEntry> {
        entry.preferred.retain(|h| !entry.unavailable.contains(h));
        if entry.is_empty() {
            return self.days.remove(&day);
        }
        self.days.insert(day, entry)
    }

    pub(super) fn put_unresolved(&mut self, key: String, mut entry: PreferenceEntry) {
        entry.preferred.retain(|h| !entry.unavailable.contains(h));
        if !entry.is_empty() {
            self.unresolved.insert(key, entry);
        }
    }
}
