//! Scam-signal detection and intelligence extraction.
//!
//! Pure, synchronous, no I/O. Detection is a case-insensitive substring OR
//! over a fixed keyword list — a deliberate over-triggering heuristic, not a
//! scored model. Extraction runs four independent regex passes over the full
//! conversation text; the caller owns merging into session state.

mod detect;
mod extract;

pub use detect::{detect, Detection, SCAM_KEYWORDS};
pub use extract::Extractor;
