use crate::{
    classify, EscalationReason, Effect, FailureKind, FatalError, FetchError, FetchOutcome,
    JunkVerdict, Msg, Phase, RunReport, RunState, Tier,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current phase are ignored.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match (state.phase(), msg) {
        (phase, Msg::Interrupted) if !phase.is_terminal() => {
            state.set_phase(Phase::Aborted);
            vec![Effect::Abort(FatalError::Interrupted)]
        }
        (Phase::Validating, Msg::Start) => {
            state.set_phase(Phase::LightweightFetch);
            vec![Effect::FetchLightweight]
        }
        (Phase::LightweightFetch, Msg::LightweightFinished(result)) => {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(error) if error.is_recoverable() => {
                    state.mark_prior_failure();
                    FetchOutcome::empty(Tier::Lightweight)
                }
                Err(error) => return abort(state, Tier::Lightweight, error),
            };
            state.set_phase(Phase::Classify);
            classify_and_route(&mut state, outcome)
        }
        (Phase::RenderFetch, Msg::RenderFinished(result)) => {
            let rendered = match result {
                Ok(outcome) => outcome,
                Err(error) if error.is_recoverable() && state.prior_failure() => {
                    state.set_phase(Phase::Aborted);
                    return (state, vec![Effect::Abort(FatalError::DoubleFailure { last: error })]);
                }
                Err(error) if error.is_recoverable() => FetchOutcome::empty(Tier::Rendered),
                Err(error) => return abort(state, Tier::Rendered, error),
            };
            state.set_phase(Phase::Select);
            state.set_rendered(rendered.clone());
            let lightweight = state
                .lightweight()
                .cloned()
                .unwrap_or_else(|| FetchOutcome::empty(Tier::Lightweight));
            let winner = select_winner(state.escalation(), lightweight, rendered);
            finish(&mut state, winner)
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn classify_and_route(state: &mut RunState, outcome: FetchOutcome) -> Vec<Effect> {
    let report = classify(&outcome, state.word_threshold());
    let reason = decide_escalation(&outcome, report.verdict, state.word_threshold());
    state.set_junk_report(report);
    state.set_escalation(reason);
    state.set_lightweight(outcome.clone());

    match reason {
        EscalationReason::None => finish(state, outcome),
        EscalationReason::Junk | EscalationReason::BelowThreshold => {
            state.set_phase(Phase::RenderFetch);
            vec![Effect::FetchRendered {
                prior_failure: state.prior_failure(),
            }]
        }
    }
}

fn finish(state: &mut RunState, winner: FetchOutcome) -> Vec<Effect> {
    state.set_phase(Phase::Done);
    vec![Effect::Finish(RunReport {
        winner,
        escalation: state.escalation(),
    })]
}

fn abort(mut state: RunState, tier: Tier, error: FetchError) -> (RunState, Vec<Effect>) {
    state.set_phase(Phase::Aborted);
    let fatal = if error.kind == FailureKind::Interrupted {
        FatalError::Interrupted
    } else {
        FatalError::Unrecoverable { tier, error }
    };
    (state, vec![Effect::Abort(fatal)])
}

/// Escalation policy for a classified lightweight outcome.
pub fn decide_escalation(
    lightweight: &FetchOutcome,
    verdict: JunkVerdict,
    word_threshold: u32,
) -> EscalationReason {
    if verdict.is_junk() {
        EscalationReason::Junk
    } else if lightweight.word_count < word_threshold {
        EscalationReason::BelowThreshold
    } else {
        EscalationReason::None
    }
}

/// Picks the final outcome once both tiers have reported.
///
/// Junk lightweight text loses to the rendered text unless the rendered text
/// is empty. Otherwise the rendered text must have strictly more words.
pub fn select_winner(
    reason: EscalationReason,
    lightweight: FetchOutcome,
    rendered: FetchOutcome,
) -> FetchOutcome {
    match reason {
        EscalationReason::None => lightweight,
        EscalationReason::Junk => {
            if rendered.is_empty() && !lightweight.is_empty() {
                lightweight
            } else {
                rendered
            }
        }
        EscalationReason::BelowThreshold => {
            if rendered.word_count > lightweight.word_count {
                rendered
            } else {
                lightweight
            }
        }
    }
}
