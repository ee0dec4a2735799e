//! Regex passes for structured intelligence.
//!
//! All four passes run unconditionally on every call, independent of the
//! detection result. The passes are not mutually exclusive: a 10-digit token
//! may legally land in both `phone_numbers` and `bank_accounts`. That overlap
//! is a known precision trade-off and is kept.

use bait_domain::IntelligenceMap;
use regex::Regex;

/// Holds the compiled extraction patterns. Build once, reuse everywhere.
#[derive(Debug, Clone)]
pub struct Extractor {
    upi: Regex,
    phone: Regex,
    url: Regex,
    account: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        // The patterns are fixed literals; compilation cannot fail.
        Self {
            upi: Regex::new(r"\b[\w.-]{2,}@[a-zA-Z]{2,}\b").unwrap(),
            phone: Regex::new(r"(?:\+?\d{1,3}[\s-]?)?(?:\d{10}|\d{3}[\s-]\d{3}[\s-]\d{4})")
                .unwrap(),
            url: Regex::new(r"https?://[\w./?=&%-]+|www\.[\w./?=&%-]+").unwrap(),
            account: Regex::new(r"\b\d{6,20}\b").unwrap(),
        }
    }

    /// Extract every intelligence category from `text`.
    ///
    /// `text` is expected to be the whole available conversation (history
    /// first, current message last, newline-joined) so intelligence spread
    /// across turns is captured in one pass. Extraction knows nothing about
    /// sessions; merging into persisted state is the caller's job.
    pub fn extract(&self, text: &str) -> IntelligenceMap {
        let mut map = IntelligenceMap::default();

        for m in self.upi.find_iter(text) {
            push_unique(&mut map.upi_ids, m.as_str().to_owned());
        }
        for m in self.phone.find_iter(text) {
            // Normalize grouped formats: "98765 43210" and "987-654-3210"
            // collapse to bare digits (keeping a leading +).
            let normalized: String = m
                .as_str()
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect();
            push_unique(&mut map.phone_numbers, normalized);
        }
        for m in self.url.find_iter(text) {
            push_unique(&mut map.phishing_links, m.as_str().to_owned());
        }
        for m in self.account.find_iter(text) {
            // Length >= 8 cuts collisions with short codes and timestamps.
            if m.as_str().len() >= 8 {
                push_unique(&mut map.bank_accounts, m.as_str().to_owned());
            }
        }

        map
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|v| *v == value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> IntelligenceMap {
        Extractor::new().extract(text)
    }

    #[test]
    fn extracts_all_categories_from_one_message() {
        let map = extract(
            "contact scammer@upi or call +911234567890, visit http://bad.example, account 123456789012",
        );
        assert!(map.upi_ids.contains(&"scammer@upi".to_owned()));
        assert!(map.phone_numbers.contains(&"+911234567890".to_owned()));
        assert!(map.phishing_links.contains(&"http://bad.example".to_owned()));
        assert!(map.bank_accounts.contains(&"123456789012".to_owned()));
    }

    #[test]
    fn ten_digit_token_lands_in_both_phone_and_account() {
        let map = extract("call 9876543210 today");
        assert!(map.phone_numbers.contains(&"9876543210".to_owned()));
        assert!(map.bank_accounts.contains(&"9876543210".to_owned()));
    }

    #[test]
    fn short_digit_runs_are_not_accounts() {
        let map = extract("otp is 123456");
        assert!(map.bank_accounts.is_empty(), "6 digits is below the 8 cutoff");
    }

    #[test]
    fn grouped_phone_is_normalized() {
        let map = extract("reach me at 987-654-3210");
        assert!(map.phone_numbers.contains(&"9876543210".to_owned()));
    }

    #[test]
    fn www_urls_are_captured() {
        let map = extract("go to www.evil.example/login?id=1 now");
        assert!(map
            .phishing_links
            .contains(&"www.evil.example/login?id=1".to_owned()));
    }

    #[test]
    fn duplicates_collapse_preserving_order() {
        let map = extract("pay1@upi then pay2@upi then pay1@upi");
        assert_eq!(map.upi_ids, vec!["pay1@upi", "pay2@upi"]);
    }

    #[test]
    fn empty_text_yields_empty_map() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn intelligence_spread_across_turns_is_found_in_joined_text() {
        let joined = "my id is pay@ybl\nsend to account 111122223333";
        let map = extract(joined);
        assert!(map.upi_ids.contains(&"pay@ybl".to_owned()));
        assert!(map.bank_accounts.contains(&"111122223333".to_owned()));
    }
}
