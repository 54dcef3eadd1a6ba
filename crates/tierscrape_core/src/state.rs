use std::fmt;

use serde::Serialize;

use crate::{FetchOutcome, JunkReport, ScrapeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    LightweightFetch,
    Classify,
    RenderFetch,
    Select,
    Done,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Aborted)
    }
}

/// Why the rendering tier ran (or `None` when it did not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    None,
    Junk,
    BelowThreshold,
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationReason::None => write!(f, "none"),
            EscalationReason::Junk => write!(f, "junk"),
            EscalationReason::BelowThreshold => write!(f, "below_threshold"),
        }
    }
}

/// Winning outcome handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub winner: FetchOutcome,
    pub escalation: EscalationReason,
}

/// Run-scoped orchestration state. One per `ScrapeConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    phase: Phase,
    word_threshold: u32,
    prior_failure: bool,
    lightweight: Option<FetchOutcome>,
    junk: Option<JunkReport>,
    escalation: EscalationReason,
    rendered: Option<FetchOutcome>,
}

impl RunState {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self::with_threshold(config.word_threshold())
    }

    pub fn with_threshold(word_threshold: u32) -> Self {
        Self {
            phase: Phase::Validating,
            word_threshold,
            prior_failure: false,
            lightweight: None,
            junk: None,
            escalation: EscalationReason::None,
            rendered: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn word_threshold(&self) -> u32 {
        self.word_threshold
    }

    pub fn prior_failure(&self) -> bool {
        self.prior_failure
    }

    pub fn lightweight(&self) -> Option<&FetchOutcome> {
        self.lightweight.as_ref()
    }

    pub fn rendered(&self) -> Option<&FetchOutcome> {
        self.rendered.as_ref()
    }

    pub fn junk_report(&self) -> Option<&JunkReport> {
        self.junk.as_ref()
    }

    pub fn escalation(&self) -> EscalationReason {
        self.escalation
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn mark_prior_failure(&mut self) {
        self.prior_failure = true;
    }

    pub(crate) fn set_lightweight(&mut self, outcome: FetchOutcome) {
        self.lightweight = Some(outcome);
    }

    pub(crate) fn set_junk_report(&mut self, report: JunkReport) {
        self.junk = Some(report);
    }

    pub(crate) fn set_escalation(&mut self, reason: EscalationReason) {
        self.escalation = reason;
    }

    pub(crate) fn set_rendered(&mut self, outcome: FetchOutcome) {
        self.rendered = Some(outcome);
    }
}
