//! Pure date arithmetic for recurring tasks. Nothing here touches storage.

mod error;
mod frequency;
mod pattern;

pub use error::RecurrenceError;
pub use frequency::{Frequency, parse_weekday, weekday_code};
pub use pattern::{Occurrences, RecurrencePattern, Successor};
