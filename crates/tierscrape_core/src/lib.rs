//! Tierscrape core: pure escalation state machine, validation and content scoring.
mod classify;
mod config;
mod effect;
mod error;
mod headers;
mod msg;
mod outcome;
mod state;
mod update;
mod validate;

pub use classify::{classify, is_junk_token, JunkReport, JunkVerdict, JUNK_RATIO_LIMIT};
pub use config::{BrowserKind, ScrapeConfig, DEFAULT_WORD_THRESHOLD};
pub use effect::Effect;
pub use error::{FailureKind, FatalError, FetchError, InputError, GRACE_DELAY};
pub use headers::{HeaderBundle, STATIC_HEADERS};
pub use msg::Msg;
pub use outcome::{count_words, FetchOutcome, Tier};
pub use state::{EscalationReason, Phase, RunReport, RunState};
pub use update::{decide_escalation, select_winner, update};
pub use validate::validate_url;
