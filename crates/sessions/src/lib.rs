//! Per-session conversation state.
//!
//! One conversation per opaque session key: ordered message history, merged
//! extracted intelligence, last-seen timestamp, and a one-way finalized flag.
//! State lives in a remote session-state service when one is configured,
//! with a permanent degrade-to-memory failover for the process lifetime —
//! availability over durability.

pub mod backend;
pub mod memory;
pub mod remote;
pub mod store;

pub use backend::SessionBackend;
pub use memory::MemoryBackend;
pub use remote::RemoteBackend;
pub use store::SessionStore;
