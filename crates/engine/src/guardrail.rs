//! Output guardrails for generated replies.
//!
//! Two independent screens run over tier-1 text before it is ever shown:
//!
//! * self-reveal — phrases that would expose the system's true nature get
//!   the whole reply swapped for a generic deflection;
//! * solicitation — phrases instructing a human to move money or share
//!   credentials get the whole reply swapped for a refusal-and-redirect.
//!
//! The forbidden text itself is never leaked, partially or otherwise.

/// Phrases that reveal the system is automated or is analyzing the sender.
pub const SELF_REVEAL_PHRASES: &[&str] = &[
    "as an ai",
    "i am an ai",
    "i'm an ai",
    "language model",
    "i am a bot",
    "i'm a bot",
    "automated system",
    "automated response",
    "honeypot",
    "scam detection",
    "i am detecting",
    "i'm detecting",
];

/// Phrases that solicit a money transfer or credential sharing.
pub const SOLICITATION_PHRASES: &[&str] = &[
    "send money",
    "send the money",
    "transfer money",
    "transfer funds",
    "wire the money",
    "send the otp",
    "share your otp",
    "share your password",
    "share your pin",
];

/// Substitute when tier-1 text would reveal the system.
pub const DEFLECTION: &str =
    "Sorry, I got distracted for a moment — what were you saying about my account?";

/// Substitute when tier-1 text solicits funds or credentials.
pub const REFUSAL: &str =
    "I'm not comfortable sending anything just yet. Can you explain again what this is about?";

/// What the screen decided about a candidate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    SelfReveal,
    Solicitation,
}

/// Screen a candidate reply. Case-insensitive substring checks.
pub fn screen(text: &str) -> Verdict {
    let lower = text.to_lowercase();
    if SELF_REVEAL_PHRASES.iter().any(|p| lower.contains(p)) {
        return Verdict::SelfReveal;
    }
    if SOLICITATION_PHRASES.iter().any(|p| lower.contains(p)) {
        return Verdict::Solicitation;
    }
    Verdict::Clean
}

/// True when `text` contains any phrase the engine must never emit.
/// Used by tests to assert the ladder's output is always safe.
pub fn contains_forbidden(text: &str) -> bool {
    screen(text) != Verdict::Clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_passes() {
        assert_eq!(screen("Which bank should I use?"), Verdict::Clean);
    }

    #[test]
    fn self_reveal_is_caught_case_insensitively() {
        assert_eq!(
            screen("As an AI assistant, I cannot help with that."),
            Verdict::SelfReveal
        );
        assert_eq!(screen("this is a HONEYPOT system"), Verdict::SelfReveal);
    }

    #[test]
    fn solicitation_is_caught() {
        assert_eq!(
            screen("Please transfer funds to this account right away"),
            Verdict::Solicitation
        );
    }

    #[test]
    fn substitutes_are_themselves_clean() {
        assert_eq!(screen(DEFLECTION), Verdict::Clean);
        assert_eq!(screen(REFUSAL), Verdict::Clean);
    }
}
