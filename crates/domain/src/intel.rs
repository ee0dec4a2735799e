//! Extracted-intelligence accumulation.
//!
//! Five fixed categories, each an ordered set of strings. Values accumulate
//! monotonically across turns: once recorded, never removed; re-insertion is
//! a no-op. Merge is per-category set union with previous values first, so
//! interleaved merges from concurrent turns converge regardless of order.

use serde::{Deserialize, Serialize};

/// Intelligence gathered from a conversation, keyed by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IntelligenceMap {
    pub bank_accounts: Vec<String>,
    pub upi_ids: Vec<String>,
    pub phishing_links: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub suspicious_keywords: Vec<String>,
}

impl IntelligenceMap {
    /// Push `value` into `list` unless already present (first-seen order).
    fn push_unique(list: &mut Vec<String>, value: &str) {
        if !list.iter().any(|v| v == value) {
            list.push(value.to_owned());
        }
    }

    /// Union-merge `other` into `self`, previous values first.
    pub fn merge(&mut self, other: &IntelligenceMap) {
        for (mine, theirs) in [
            (&mut self.bank_accounts, &other.bank_accounts),
            (&mut self.upi_ids, &other.upi_ids),
            (&mut self.phishing_links, &other.phishing_links),
            (&mut self.phone_numbers, &other.phone_numbers),
            (&mut self.suspicious_keywords, &other.suspicious_keywords),
        ] {
            for v in theirs {
                Self::push_unique(mine, v);
            }
        }
    }

    /// Record suspicious keywords (e.g. from the per-turn detector).
    pub fn add_keywords<'a>(&mut self, keywords: impl IntoIterator<Item = &'a str>) {
        for k in keywords {
            Self::push_unique(&mut self.suspicious_keywords, k);
        }
    }

    /// True when any hard-evidence category holds at least one value.
    ///
    /// Suspicious keywords alone are not evidence — they flag nearly every
    /// detected turn and would close cases before anything useful is learned.
    pub fn has_evidence(&self) -> bool {
        !self.bank_accounts.is_empty()
            || !self.upi_ids.is_empty()
            || !self.phishing_links.is_empty()
            || !self.phone_numbers.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_evidence() && self.suspicious_keywords.is_empty()
    }

    /// Total number of recorded items across all categories.
    pub fn total_items(&self) -> usize {
        self.bank_accounts.len()
            + self.upi_ids.len()
            + self.phishing_links.len()
            + self.phone_numbers.len()
            + self.suspicious_keywords.len()
    }
}

/// The outbound case payload delivered to the external reporting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub session_id: String,
    /// Always `true` when a case is actually sent.
    pub scam_detected: bool,
    pub total_messages_exchanged: usize,
    pub extracted_intelligence: IntelligenceMap,
    pub agent_notes: String,
}
