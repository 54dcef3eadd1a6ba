use crate::{FatalError, RunReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchLightweight,
    /// `prior_failure` tells the renderer whether its own failure would be the second one.
    FetchRendered { prior_failure: bool },
    Finish(RunReport),
    Abort(FatalError),
}
