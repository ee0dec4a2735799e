//! Keyword-based scam detection over the current message only.

/// Fixed keyword list. Order here is the order keywords are reported in.
pub const SCAM_KEYWORDS: &[&str] = &[
    "verify",
    "account blocked",
    "will be blocked",
    "upi id",
    "share your",
    "bank account",
    "suspend",
    "suspension",
    "immediately",
    "urgent",
    "verify now",
    "password",
];

/// Result of scanning one message for scam signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub scam: bool,
    /// Matched keywords in list order, each at most once.
    pub matched_keywords: Vec<String>,
}

/// Scan `text` for scam keywords. Deterministic, current message only.
pub fn detect(text: &str) -> Detection {
    let lower = text.to_lowercase();
    let matched: Vec<String> = SCAM_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| (*k).to_owned())
        .collect();

    Detection {
        scam: !matched.is_empty(),
        matched_keywords: matched,
    }
}
