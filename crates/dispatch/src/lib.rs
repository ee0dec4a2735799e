//! Case finalization: delivery to the external reporting endpoint and the
//! autonomous background loop that decides when a session is done.

pub mod delivery;
pub mod finalizer;

pub use delivery::{CaseDelivery, DeliveryOutcome, HttpCaseDelivery};
pub use finalizer::{AutoFinalizer, Trigger};
