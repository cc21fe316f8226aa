use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::CalendarError;

/// Recurrence engine errors
#[derive(Error, Debug)]
pub enum RecurError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Recurrence cursor failed to advance past {0}")]
    CursorStalled(NaiveDate),

    #[error("Emitted count {emitted} exceeds the occurrence limit of {limit}")]
    CountOverrun { emitted: u32, limit: u32 },

    #[error("Expansion exceeded the step limit of {0}")]
    StepLimitExceeded(usize),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Core(#[from] cadence_core::error::CoreError),
}

pub type RecurResult<T> = std::result::Result<T, RecurError>;
