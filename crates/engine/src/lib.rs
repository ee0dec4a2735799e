//! Conversation engine: reply generation and turn orchestration.
//!
//! The reply generator walks a fixed fallback ladder — external generation
//! service, guardrail filter, rule-based utterance pools, generic probes —
//! and never surfaces a hard failure. The event handler runs one inbound
//! turn end to end: detect, extract, merge, persist, reply.

pub mod guardrail;
pub mod handler;
pub mod provider;
pub mod reply;

pub use handler::{EngagementMetrics, EventHandler, TurnEvent, TurnOutcome};
pub use provider::{OpenAiCompatProvider, ReplyProvider};
pub use reply::{ReplyGenerator, ReplyTier};
