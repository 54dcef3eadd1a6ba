//! Cheap junk gate for extracted text.
//!
//! Flags text dominated by class names, ARIA/data attributes and inline CSS
//! that leaks into block elements on client-rendered pages. Approximate by
//! nature: it only decides whether the rendering tier is worth paying for.
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::FetchOutcome;

/// Share of junk tokens above which text is junk outright.
pub const JUNK_RATIO_LIMIT: f64 = 0.3;
const CLEAN_WORDS_FACTOR: f64 = 0.75;
const MIN_WORDS_FOR_CLEAN_CHECK: u32 = 10;
const CODE_FRAGMENT_MAX_LEN: usize = 40;

const JUNK_PREFIXES: &[&str] = &[
    "css-", "jsx-", "sc-", "mui-", "Mui", "jss", "chakra-", "emotion-", "svelte-", "ng-", "v-",
    "tw-", "data-", "aria-", "style=", "class=", "className=", "--",
];

fn multi_hyphen() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+(-[A-Za-z0-9_]+){2,}$").ok())
        .as_ref()
}

fn code_fragment() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z-]+\s*:\s*[^;\s]*;").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunkVerdict {
    Junk,
    Clean,
}

impl JunkVerdict {
    pub fn is_junk(self) -> bool {
        matches!(self, JunkVerdict::Junk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunkReport {
    pub verdict: JunkVerdict,
    pub junk_tokens: u32,
    pub total_tokens: u32,
    pub junk_ratio: f64,
}

impl fmt::Display for JunkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.verdict.is_junk() { "junk" } else { "clean" };
        write!(
            f,
            "{verdict} ({}/{} junk tokens, ratio {:.2})",
            self.junk_tokens, self.total_tokens, self.junk_ratio
        )
    }
}

pub fn is_junk_token(token: &str) -> bool {
    JUNK_PREFIXES.iter().any(|prefix| token.starts_with(prefix))
        || multi_hyphen().is_some_and(|re| re.is_match(token))
        || (token.len() <= CODE_FRAGMENT_MAX_LEN
            && code_fragment().is_some_and(|re| re.is_match(token)))
}

/// Scores an outcome against the word threshold. Empty outcomes are never junk.
pub fn classify(outcome: &FetchOutcome, word_threshold: u32) -> JunkReport {
    let mut total_tokens = 0u32;
    let mut junk_tokens = 0u32;
    for token in outcome.text.split_whitespace() {
        total_tokens += 1;
        if is_junk_token(token) {
            junk_tokens += 1;
        }
    }

    if outcome.word_count == 0 || total_tokens == 0 {
        return JunkReport {
            verdict: JunkVerdict::Clean,
            junk_tokens: 0,
            total_tokens,
            junk_ratio: 0.0,
        };
    }

    let junk_ratio = f64::from(junk_tokens) / f64::from(total_tokens);
    let clean_words = f64::from(outcome.word_count) - f64::from(junk_tokens);
    let too_few_clean = outcome.word_count > MIN_WORDS_FOR_CLEAN_CHECK
        && clean_words < CLEAN_WORDS_FACTOR * f64::from(word_threshold);

    let verdict = if junk_ratio > JUNK_RATIO_LIMIT || too_few_clean {
        JunkVerdict::Junk
    } else {
        JunkVerdict::Clean
    };

    JunkReport {
        verdict,
        junk_tokens,
        total_tokens,
        junk_ratio,
    }
}
