//! Thin HTTP surface over the session intelligence engine.
//!
//! Routing, request shape and auth only — all real behavior lives in the
//! engine, sessions and dispatch crates.

pub mod api;
pub mod cli;
pub mod keys;
pub mod state;
