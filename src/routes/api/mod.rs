pub mod auth;
pub mod categories;
pub mod households;
mod params;
pub mod protected;
pub mod public;
pub mod recurrence;
mod router;
pub mod tasks;

pub use router::router;
