use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Lightweight,
    Rendered,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Lightweight => write!(f, "lightweight"),
            Tier::Rendered => write!(f, "rendered"),
        }
    }
}

/// Result of one fetch attempt. A failed attempt is the zero outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    pub tier: Tier,
    pub word_count: u32,
    pub text: String,
}

impl FetchOutcome {
    pub fn from_text(tier: Tier, text: String) -> Self {
        Self {
            tier,
            word_count: count_words(&text),
            text,
        }
    }

    pub fn empty(tier: Tier) -> Self {
        Self {
            tier,
            word_count: 0,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Counts tokens split on a single `' '`.
///
/// Newlines do not separate tokens and consecutive spaces yield empty tokens
/// that still count; the junk thresholds are tuned against this rule.
/// The empty string counts as zero.
pub fn count_words(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    text.split(' ').count() as u32
}
