use thiserror::Error;

/// Rejected mutation of the schedule dimensions or their label arrays.
///
/// Every variant is recoverable: the store is left exactly as it was before
/// the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} must be a positive integer, got {value}")]
    NonPositive { kind: &'static str, value: String },

    #[error("daysPerWeek must be in 1..=7, got {0}")]
    DaysPerWeekOutOfRange(i64),

    #[error("classesPerDay must be in 1..=24, got {0}")]
    ClassesPerDayOutOfRange(i64),

    #[error("duplicate day indices")]
    DuplicateDayIndices,

    #[error("day index {0} is not a weekday id (0..=6)")]
    DayIndexOutOfRange(i64),

    #[error("expected {expected} labels, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    #[error("hour index {index} is outside 0..{classes_per_day}")]
    HourIndexOutOfRange { index: usize, classes_per_day: u32 },
}

impl ValidationError {
    /// Stable identifier reported to IPC clients in `error.details.reason`.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NonPositive { .. } => "non_positive",
            Self::DaysPerWeekOutOfRange(_) => "days_per_week_out_of_range",
            Self::ClassesPerDayOutOfRange(_) => "classes_per_day_out_of_range",
            Self::DuplicateDayIndices => "duplicate_day_indices",
            Self::DayIndexOutOfRange(_) => "day_index_out_of_range",
            Self::LabelCountMismatch { .. } => "label_count_mismatch",
            Self::HourIndexOutOfRange { .. } => "hour_index_out_of_range",
        }
    }
}
