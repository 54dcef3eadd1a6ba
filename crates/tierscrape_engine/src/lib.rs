//! Tierscrape engine: the IO side of the escalation pipeline.
mod challenge;
mod decode;
mod engine;
mod fetch;
mod normalize;
mod progress;
mod render;

pub use challenge::is_challenge;
pub use decode::{decode_page, DecodedPage};
pub use engine::{run_blocking, ScrapeEngine};
pub use fetch::{FetchSettings, Fetcher, RawPage, ReqwestFetcher};
pub use normalize::{normalize_whitespace, BlockTextNormalizer, Normalizer};
pub use progress::{EngineEvent, LogProgressSink, NullProgressSink, ProgressSink};
pub use render::{
    find_chromium, navigate_within, settle, ChromiumRenderer, RenderSettings, Renderer,
};
