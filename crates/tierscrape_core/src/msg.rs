use crate::{FetchError, FetchOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Config accepted; begin the lightweight tier.
    Start,
    /// Lightweight tier finished (already normalized on success).
    LightweightFinished(Result<FetchOutcome, FetchError>),
    /// Rendering tier finished.
    RenderFinished(Result<FetchOutcome, FetchError>),
    /// Process interruption signal.
    Interrupted,
}
