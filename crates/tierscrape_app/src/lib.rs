//! Command-line surface of the `tierscrape` binary.
pub mod cli;
pub mod handoff;

pub use cli::Cli;
pub use handoff::render_handoff;
