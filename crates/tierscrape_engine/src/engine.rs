use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::thread;

use engine_logging::{engine_debug, engine_error, engine_warn};
use tierscrape_core::{
    update, Effect, FailureKind, FatalError, FetchError, FetchOutcome, HeaderBundle, Msg,
    RunReport, RunState, ScrapeConfig, Tier,
};
use tokio_util::task::AbortOnDropHandle;

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::normalize::{BlockTextNormalizer, Normalizer};
use crate::render::{ChromiumRenderer, RenderSettings, Renderer};
use crate::{EngineEvent, LogProgressSink, ProgressSink};

/// Executes the effects of the escalation state machine against real tiers.
#[derive(Clone)]
pub struct ScrapeEngine {
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
    normalizer: Arc<dyn Normalizer>,
    sink: Arc<dyn ProgressSink>,
}

impl ScrapeEngine {
    pub fn new(fetch: FetchSettings, render: RenderSettings) -> Self {
        Self::with_parts(
            Arc::new(ReqwestFetcher::new(fetch)),
            Arc::new(ChromiumRenderer::new(render)),
            Arc::new(BlockTextNormalizer),
            Arc::new(LogProgressSink),
        )
    }

    pub fn with_parts(
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
        normalizer: Arc<dyn Normalizer>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            normalizer,
            sink,
        }
    }

    pub async fn run(&self, config: &ScrapeConfig) -> Result<RunReport, FatalError> {
        self.run_until(config, std::future::pending()).await
    }

    /// Runs the pipeline, aborting with `FatalError::Interrupted` if `interrupt` resolves first.
    pub async fn run_until<I>(
        &self,
        config: &ScrapeConfig,
        interrupt: I,
    ) -> Result<RunReport, FatalError>
    where
        I: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut state = RunState::new(config);
        let mut inbox = VecDeque::from([Msg::Start]);

        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;

            for effect in effects {
                let reply = match effect {
                    Effect::FetchLightweight => tokio::select! {
                        biased;
                        _ = &mut interrupt => Msg::Interrupted,
                        result = self.lightweight(config) => Msg::LightweightFinished(result),
                    },
                    Effect::FetchRendered { prior_failure } => {
                        if let Some(junk) = state.junk_report() {
                            engine_debug!(
                                "escalating to the rendering tier ({}): {junk}",
                                state.escalation()
                            );
                        }
                        tokio::select! {
                            biased;
                            _ = &mut interrupt => Msg::Interrupted,
                            result = self.rendered(config, prior_failure) => Msg::RenderFinished(result),
                        }
                    }
                    Effect::Finish(report) => return Ok(report),
                    Effect::Abort(fatal) => return Err(fatal),
                };
                inbox.push_back(reply);
            }
        }

        Err(FatalError::Runtime(format!(
            "escalation stopped in phase {:?} without a result",
            state.phase()
        )))
    }

    async fn lightweight(&self, config: &ScrapeConfig) -> Result<FetchOutcome, FetchError> {
        self.sink.emit(EngineEvent::TierStarted {
            tier: Tier::Lightweight,
        });

        let fetcher = self.fetcher.clone();
        let normalizer = self.normalizer.clone();
        let sink = self.sink.clone();
        let url = config.url().clone();
        let headers = HeaderBundle::for_config(config);

        let task = AbortOnDropHandle::new(tokio::spawn(async move {
            let page = fetcher.fetch(&url, &headers, sink.as_ref()).await?;
            engine_debug!(
                "fetched {} (status {}, {} redirects, {})",
                page.final_url,
                page.status,
                page.redirect_count,
                page.encoding
            );
            let text = normalizer.normalize(&page.html);
            Ok(FetchOutcome::from_text(Tier::Lightweight, text))
        }));

        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(FetchError::new(
                FailureKind::Unexpected,
                format!("lightweight task failed: {join_error}"),
            )),
        };
        self.report(config, Tier::Lightweight, &result, false);
        result
    }

    async fn rendered(
        &self,
        config: &ScrapeConfig,
        prior_failure: bool,
    ) -> Result<FetchOutcome, FetchError> {
        self.sink.emit(EngineEvent::TierStarted {
            tier: Tier::Rendered,
        });

        let headers = HeaderBundle::for_config(config);
        let result = self
            .renderer
            .render(config.url(), config.browser(), &headers, self.sink.as_ref())
            .await
            .map(|html| FetchOutcome::from_text(Tier::Rendered, self.normalizer.normalize(&html)));
        self.report(config, Tier::Rendered, &result, prior_failure);
        result
    }

    fn report(
        &self,
        config: &ScrapeConfig,
        tier: Tier,
        result: &Result<FetchOutcome, FetchError>,
        prior_failure: bool,
    ) {
        match result {
            Ok(outcome) => self.sink.emit(EngineEvent::TierCompleted {
                tier,
                word_count: outcome.word_count,
            }),
            Err(error) => {
                if !error.is_recoverable() {
                    engine_error!(
                        "[Unrecoverable] {tier} scrape of {} failed: {error}",
                        config.url()
                    );
                } else if prior_failure {
                    engine_error!("Scraping job failed!! {tier} tier: {error}");
                } else {
                    engine_warn!(
                        "[Recoverable] {tier} scrape of {} failed: {error}",
                        config.url()
                    );
                }
                self.sink.emit(EngineEvent::TierFailed {
                    tier,
                    error: error.clone(),
                });
            }
        }
    }
}

/// Runs one scrape to completion from synchronous code, listening for Ctrl-C.
///
/// Without a current tokio runtime a fresh one is built on this thread. Inside
/// a runtime the run moves to a dedicated thread with its own runtime, so the
/// caller's scheduler is never nested.
pub fn run_blocking(engine: ScrapeEngine, config: ScrapeConfig) -> Result<RunReport, FatalError> {
    if tokio::runtime::Handle::try_current().is_err() {
        return block_on_own_runtime(&engine, &config);
    }

    engine_debug!("called from inside a tokio runtime; running on a dedicated thread");
    thread::spawn(move || block_on_own_runtime(&engine, &config))
        .join()
        .unwrap_or_else(|_| Err(FatalError::Runtime("scrape thread panicked".into())))
}

fn block_on_own_runtime(
    engine: &ScrapeEngine,
    config: &ScrapeConfig,
) -> Result<RunReport, FatalError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| FatalError::Runtime(err.to_string()))?;
    runtime.block_on(engine.run_until(config, interrupt_signal()))
}

async fn interrupt_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        engine_warn!("cannot listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
