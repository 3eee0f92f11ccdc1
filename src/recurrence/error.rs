use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("Unknown frequency '{0}', expected daily, weekly, monthly or yearly")]
    UnknownFrequency(String),
    #[error("Interval must be at least 1 (got {0})")]
    InvalidInterval(i64),
    #[error("Unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("Days of week only apply to weekly recurrence (got {0})")]
    DaysOfWeekNotWeekly(&'static str),
    #[error("Day of month must be between 1 and 31 (got {0})")]
    InvalidDayOfMonth(i64),
    #[error("Day of month only applies to monthly or yearly recurrence (got {0})")]
    DayOfMonthNotMonthly(&'static str),
    #[error("Occurrences must be at least 1 (got {0})")]
    InvalidOccurrences(i64),
}
