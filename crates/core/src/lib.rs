//! Sahayak Core
//!
//! Session-state bookkeeping for the Sahayak teaching assistant: typed state
//! for the fun-activity and lesson-planning domains, the pure updates applied
//! after each agent interaction, the suggestions derived from that state, and
//! the declarative agent catalog handed to the orchestration runtime.

pub mod activity;
pub mod agents;
pub mod clock;
pub mod error;
pub mod history;
pub mod planning;
pub mod prompts;
pub mod state;
pub mod summary;

pub use error::StateError;
pub use state::{Domain, SessionEvent, SessionState};
