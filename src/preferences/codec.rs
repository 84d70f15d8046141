use super::matrix::{PreferenceEntry, PreferenceMatrix};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// How a raw preference key maps onto the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayKey {
    Index(i64),
    Unresolved(String),
}

/// Exact integer value of `f`, if it has one that fits in an i64.
fn integral_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Numeric keys are day indices; otherwise the key is looked up among the
/// configured day names (first exact match).
pub fn resolve_day_key(key: &str, day_names: &[String]) -> DayKey {
    if let Some(n) = key.trim().parse::<f64>().ok().and_then(integral_i64) {
        return DayKey::Index(n);
    }
    match day_names.iter().position(|name| name == key) {
        Some(pos) => DayKey::Index(pos as i64),
        None => DayKey::Unresolved(key.to_string()),
    }
}

fn parse_hour(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    integral_i64(f)
}

fn parse_hours(key: &str, field: &str, v: Option<&Value>) -> BTreeSet<i64> {
    let Some(v) = v else {
        return BTreeSet::new();
    };
    let Some(items) = v.as_array() else {
        if !v.is_null() {
            warn!(day = key, field, "preference hours are not a list; ignoring");
        }
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let hour = parse_hour(item);
            if hour.is_none() {
                warn!(day = key, field, value = %item, "skipping non-integer hour");
            }
            hour
        })
        .collect()
}

fn decode_entry(key: &str, v: &Value) -> PreferenceEntry {
    let entry = match v {
        // Legacy shape: a bare list means "unavailable".
        Value::Array(_) => PreferenceEntry {
            unavailable: parse_hours(key, "unavailable", Some(v)),
            preferred: BTreeSet::new(),
        },
        Value::Object(obj) => PreferenceEntry {
            unavailable: parse_hours(key, "unavailable", obj.get("unavailable")),
            preferred: parse_hours(key, "preferred", obj.get("preferred")),
        },
        Value::Null => PreferenceEntry::default(),
        other => {
            warn!(day = key, value = %other, "unsupported preference value; treating as empty");
            PreferenceEntry::default()
        }
    };
    if !entry.unavailable.is_disjoint(&entry.preferred) {
        warn!(day = key, "hours listed as both unavailable and preferred; keeping unavailable");
    }
    entry
}

/// Never fails: malformed pieces are logged and skipped.
pub fn decode(raw: &Value, day_names: &[String]) -> PreferenceMatrix {
    let mut matrix = PreferenceMatrix::new();
    let obj = match raw {
        Value::Object(obj) => obj,
        Value::Null => return matrix,
        Value::String(s) if s.trim().is_empty() => return matrix,
        other => {
            warn!(value = %other, "preferences payload is not an object; ignoring");
            return matrix;
        }
    };

    for (key, value) in obj {
        let entry = decode_entry(key, value);
        match resolve_day_key(key, day_names) {
            DayKey::Index(day) => {
                if matrix.put_day(day, entry).is_some() {
                    warn!(day, key = key.as_str(), "several keys resolve to one day; last one wins");
                }
            }
            DayKey::Unresolved(key) => {
                warn!(key = key.as_str(), "unresolved day key; passing through unchanged");
                matrix.put_unresolved(key, entry);
            }
        }
    }
    matrix
}

fn encode_entry(entry: &PreferenceEntry) -> Value {
    json!({
        "unavailable": entry.unavailable.iter().collect::<Vec<_>>(),
        "preferred": entry.preferred.iter().collect::<Vec<_>>(),
    })
}

/// Canonical form: one key per constrained day, hours ascending.
pub fn encode(matrix: &PreferenceMatrix) -> Value {
    let mut out = Map::new();
    for (key, entry) in matrix.unresolved() {
        out.insert(key.to_string(), encode_entry(entry));
    }
    for (day, entry) in matrix.days() {
        out.insert(day.to_string(), encode_entry(entry));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::matrix::SlotStatus;

    fn names() -> Vec<String> {
        ["Monday", "Tuesday", "Wednesday"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn legacy_list_decodes_as_unavailable() {
        let m = decode(&json!({ "0": [1, 2] }), &[]);
        assert_eq!(m.unavailable(0), vec![1, 2]);
        assert!(m.preferred(0).is_empty());
    }

    #[test]
    fn canonical_form_round_trips() {
        let raw = json!({
            "0": { "unavailable": [0, 3], "preferred": [] },
            "2": { "unavailable": [], "preferred": [1, 4] },
            "4": { "unavailable": [2], "preferred": [5] }
        });
        assert_eq!(encode(&decode(&raw, &names())), raw);
    }

    #[test]
    fn day_names_resolve_by_position() {
        let raw = json!({ "Tuesday": { "preferred": [3] } });
        let m = decode(&raw, &names());
        assert_eq!(m.status(1, 3), SlotStatus::Preferred);
        assert_eq!(
            encode(&m),
            json!({ "1": { "unavailable": [], "preferred": [3] } })
        );
    }

    #[test]
    fn unresolved_keys_pass_through() {
        let raw = json!({ "Funday": [2, 1], "0": [5] });
        let m = decode(&raw, &names());
        assert_eq!(m.unresolved().count(), 1);
        assert_eq!(m.status(0, 5), SlotStatus::Unavailable);
        assert_eq!(
            encode(&m),
            json!({
                "0": { "unavailable": [5], "preferred": [] },
                "Funday": { "unavailable": [1, 2], "preferred": [] }
            })
        );
    }

    #[test]
    fn resolve_day_key_prefers_numbers_then_names() {
        let n = names();
        assert_eq!(resolve_day_key("2", &n), DayKey::Index(2));
        assert_eq!(resolve_day_key(" 4 ", &n), DayKey::Index(4));
        assert_eq!(resolve_day_key("Wednesday", &n), DayKey::Index(2));
        assert_eq!(resolve_day_key("wednesday", &n), DayKey::Unresolved("wednesday".into()));
        assert_eq!(resolve_day_key("1.5", &n), DayKey::Unresolved("1.5".into()));
    }

    #[test]
    fn numeric_keys_beyond_i64_pass_through_verbatim() {
        let raw = json!({ "1e300": [1], "-1e19": [4], "1e3": [2] });
        let m = decode(&raw, &[]);
        assert_eq!(m.unavailable(1000), vec![2]);
        assert!(m.day(i64::MAX).is_none());
        assert!(m.day(i64::MIN).is_none());
        assert_eq!(
            encode(&m),
            json!({
                "-1e19": { "unavailable": [4], "preferred": [] },
                "1000": { "unavailable": [2], "preferred": [] },
                "1e300": { "unavailable": [1], "preferred": [] }
            })
        );
    }

    #[test]
    fn hours_beyond_i64_are_skipped() {
        let raw = json!({ "0": [1, 1e300, "9.3e18", 2] });
        let m = decode(&raw, &[]);
        assert_eq!(m.unavailable(0), vec![1, 2]);
    }

    #[test]
    fn empty_days_are_dropped_and_missing_fields_default() {
        let raw = json!({
            "0": { "unavailable": [], "preferred": [] },
            "1": [],
            "2": { "unavailable": [1] }
        });
        let m = decode(&raw, &[]);
        assert!(m.day(0).is_none());
        assert!(m.day(1).is_none());
        assert_eq!(
            encode(&m),
            json!({ "2": { "unavailable": [1], "preferred": [] } })
        );
    }

    #[test]
    fn overlapping_hours_stay_unavailable() {
        let raw = json!({ "1": { "unavailable": [2, 3], "preferred": [3, 4] } });
        let m = decode(&raw, &[]);
        assert_eq!(m.unavailable(1), vec![2, 3]);
        assert_eq!(m.preferred(1), vec![4]);
    }

    #[test]
    fn malformed_hours_are_skipped() {
        let raw = json!({ "0": [1, "2", "x", 2.5, null, 3.0] });
        let m = decode(&raw, &[]);
        assert_eq!(m.unavailable(0), vec![1, 2, 3]);
    }

    #[test]
    fn non_object_payloads_decode_empty() {
        assert!(decode(&json!(null), &[]).is_empty());
        assert!(decode(&json!(""), &[]).is_empty());
        assert!(decode(&json!([1, 2]), &[]).is_empty());
        assert_eq!(encode(&PreferenceMatrix::new()), json!({}));
    }

    #[test]
    fn toggled_day_disappears_from_encoding() {
        let mut m = PreferenceMatrix::new();
        for _ in 0..3 {
            m.toggle(1, 2);
        }
        assert_eq!(encode(&m), json!({}));
    }
}
