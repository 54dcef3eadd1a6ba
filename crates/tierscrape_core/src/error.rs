use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::Tier;

/// Pause before a fatal exit so in-flight diagnostics reach the terminal.
pub const GRACE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid url {0:?}: expected an absolute http(s) url with a dotted host")]
    InvalidUrl(String),
    #[error("the browser {0:?} is not supported")]
    UnsupportedBrowser(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus(u16),
    Network,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Challenge,
    NavigationTimeout,
    Driver,
    Interrupted,
    Unexpected,
}

impl FailureKind {
    /// Recoverable failures degrade the tier to a zero outcome; the rest end the run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FailureKind::Interrupted | FailureKind::Unexpected)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Challenge => write!(f, "anti-bot challenge"),
            FailureKind::NavigationTimeout => write!(f, "navigation timeout"),
            FailureKind::Driver => write!(f, "browser driver error"),
            FailureKind::Interrupted => write!(f, "interrupted"),
            FailureKind::Unexpected => write!(f, "unexpected failure"),
        }
    }
}

/// Errors that end the run with a non-zero exit code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("scraping job failed: both tiers failed (last error: {last})")]
    DoubleFailure { last: FetchError },
    #[error("unexpected failure in the {tier} tier: {error}")]
    Unrecoverable { tier: Tier, error: FetchError },
    #[error("interrupted by user or system")]
    Interrupted,
    #[error("failed to run the scrape: {0}")]
    Runtime(String),
}

impl FatalError {
    pub fn exit_code(&self) -> i32 {
        match self {
            FatalError::Input(_) => 2,
            FatalError::Interrupted => 130,
            FatalError::DoubleFailure { .. }
            | FatalError::Unrecoverable { .. }
            | FatalError::Runtime(_) => 1,
        }
    }
}
