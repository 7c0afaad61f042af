//! Observability for MovieMatch
//!
//! Structured JSON logging only. Log calls are synchronous and never fail
//! the caller.
//!
//! ```ignore
//! use moviematch::observability::{Event, Logger};
//!
//! Logger::info(Event::MovieDeleted, &[("id", "tt0111161")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
