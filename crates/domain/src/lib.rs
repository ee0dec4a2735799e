//! Shared types for the Baitline engine.
//!
//! Everything that crosses a crate boundary lives here: the wire-level
//! message and intelligence types, the shared error enum, the config tree,
//! and the structured trace events.

pub mod config;
pub mod error;
pub mod intel;
pub mod message;
pub mod trace;

pub use config::Config;
pub use error::{Error, Result};
pub use intel::{CaseSummary, IntelligenceMap};
pub use message::Message;
pub use trace::TraceEvent;
