use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tierscrape_core::{FetchError, Tier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TierStarted { tier: Tier },
    Downloading { bytes: u64 },
    Navigated { elapsed: Duration },
    Settling { elapsed: Duration, total: Duration },
    TierCompleted { tier: Tier, word_count: u32 },
    TierFailed { tier: Tier, error: FetchError },
}

/// Observer for run progress. Must never block; it cannot influence the run.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Forwards events to the log. Settle ticks go to debug, with an info line every ten seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

const SETTLE_INFO_EVERY_SECS: u64 = 10;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::TierStarted { tier } => engine_info!("{tier} scrape job starting...."),
            EngineEvent::Downloading { bytes } => engine_debug!("downloaded {bytes} bytes"),
            EngineEvent::Navigated { elapsed } => {
                engine_info!("page DOM ready after {:.1}s", elapsed.as_secs_f64())
            }
            EngineEvent::Settling { elapsed, total } => {
                let secs = elapsed.as_secs();
                if secs > 0 && secs % SETTLE_INFO_EVERY_SECS == 0 {
                    engine_info!("settling {secs}/{}s", total.as_secs());
                } else {
                    engine_debug!("settling {secs}/{}s", total.as_secs());
                }
            }
            EngineEvent::TierCompleted { tier, word_count } => {
                engine_info!("{tier} scrape job completed with {word_count} words worth of content")
            }
            // Failures are logged by the engine with recoverability context.
            EngineEvent::TierFailed { tier, error } => engine_debug!("{tier} tier failed: {error}"),
        }
    }
}
