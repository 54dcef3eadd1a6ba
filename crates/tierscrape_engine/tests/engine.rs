use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tierscrape_core::{
    BrowserKind, EscalationReason, FailureKind, FatalError, FetchError, HeaderBundle,
    ScrapeConfig, Tier,
};
use tierscrape_engine::{
    run_blocking, BlockTextNormalizer, EngineEvent, Fetcher, NullProgressSink, ProgressSink,
    RawPage, Renderer, ScrapeEngine,
};
use url::Url;

struct FakeFetcher {
    result: Result<String, FetchError>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn html(html: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(html.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(kind: FailureKind) -> Arc<Self> {
        Arc::new(Self {
            result: Err(FetchError::new(kind, "fake fetch failure")),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &Url,
        _headers: &HeaderBundle,
        _sink: &dyn ProgressSink,
    ) -> Result<RawPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let html = self.result.clone()?;
        Ok(RawPage {
            final_url: url.to_string(),
            status: 200,
            redirect_count: 0,
            content_type: Some("text/html".into()),
            encoding: "UTF-8",
            html,
        })
    }
}

struct FakeRenderer {
    result: Result<String, FetchError>,
    calls: AtomicUsize,
}

impl FakeRenderer {
    fn html(html: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(html.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(kind: FailureKind) -> Arc<Self> {
        Arc::new(Self {
            result: Err(FetchError::new(kind, "fake render failure")),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn render(
        &self,
        _url: &Url,
        _browser: BrowserKind,
        _headers: &HeaderBundle,
        _sink: &dyn ProgressSink,
    ) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn paragraphs(words: usize, word: &str) -> String {
    let sentence = vec![word; words].join(" ");
    format!("<html><body><p>{sentence}</p></body></html>")
}

fn config(threshold: u32) -> ScrapeConfig {
    ScrapeConfig::new("https://example.com/article", "chrome")
        .unwrap()
        .with_word_threshold(threshold)
}

fn engine(fetcher: Arc<FakeFetcher>, renderer: Arc<FakeRenderer>) -> ScrapeEngine {
    ScrapeEngine::with_parts(
        fetcher,
        renderer,
        Arc::new(BlockTextNormalizer),
        Arc::new(NullProgressSink),
    )
}

#[tokio::test]
async fn enough_clean_words_never_start_the_browser() {
    let fetcher = FakeFetcher::html(&paragraphs(120, "word"));
    let renderer = FakeRenderer::html(&paragraphs(500, "rendered"));

    let report = engine(fetcher.clone(), renderer.clone())
        .run(&config(80))
        .await
        .unwrap();

    assert_eq!(report.winner.tier, Tier::Lightweight);
    assert_eq!(report.winner.word_count, 120);
    assert_eq!(report.escalation, EscalationReason::None);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn junk_page_escalates_and_rendered_text_wins() {
    let fetcher = FakeFetcher::html(&paragraphs(100, "css-1x2y3z"));
    let renderer = FakeRenderer::html(&paragraphs(40, "prose"));

    let report = engine(fetcher, renderer.clone())
        .run(&config(80))
        .await
        .unwrap();

    assert_eq!(report.escalation, EscalationReason::Junk);
    assert_eq!(report.winner.tier, Tier::Rendered);
    assert_eq!(report.winner.word_count, 40);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn thin_page_keeps_the_larger_result() {
    let larger_render = engine(
        FakeFetcher::html(&paragraphs(8, "short")),
        FakeRenderer::html(&paragraphs(300, "long")),
    )
    .run(&config(80))
    .await
    .unwrap();
    assert_eq!(larger_render.escalation, EscalationReason::BelowThreshold);
    assert_eq!(larger_render.winner.tier, Tier::Rendered);
    assert_eq!(larger_render.winner.word_count, 300);

    let smaller_render = engine(
        FakeFetcher::html(&paragraphs(8, "short")),
        FakeRenderer::html(&paragraphs(5, "tiny")),
    )
    .run(&config(80))
    .await
    .unwrap();
    assert_eq!(smaller_render.winner.tier, Tier::Lightweight);
    assert_eq!(smaller_render.winner.word_count, 8);
}

#[tokio::test]
async fn lightweight_failure_falls_back_to_the_browser() {
    let report = engine(
        FakeFetcher::failing(FailureKind::HttpStatus(403)),
        FakeRenderer::html(&paragraphs(90, "rendered")),
    )
    .run(&config(80))
    .await
    .unwrap();

    assert_eq!(report.winner.tier, Tier::Rendered);
    assert_eq!(report.winner.word_count, 90);
}

#[tokio::test]
async fn both_tiers_failing_is_fatal() {
    let err = engine(
        FakeFetcher::failing(FailureKind::Timeout),
        FakeRenderer::failing(FailureKind::NavigationTimeout),
    )
    .run(&config(80))
    .await
    .unwrap_err();

    match &err {
        FatalError::DoubleFailure { last } => {
            assert_eq!(last.kind, FailureKind::NavigationTimeout)
        }
        other => panic!("expected double failure, got {other:?}"),
    }
    assert_ne!(err.exit_code(), 0);
}

#[tokio::test]
async fn unexpected_failure_aborts_without_escalating() {
    let renderer = FakeRenderer::html(&paragraphs(90, "rendered"));
    let err = engine(FakeFetcher::failing(FailureKind::Unexpected), renderer.clone())
        .run(&config(80))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FatalError::Unrecoverable {
            tier: Tier::Lightweight,
            ..
        }
    ));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn interrupt_aborts_the_run() {
    let fetcher = FakeFetcher::html(&paragraphs(120, "word"));
    let err = engine(fetcher, FakeRenderer::html(""))
        .run_until(&config(80), std::future::ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err, FatalError::Interrupted));
    assert_eq!(err.exit_code(), 130);
}

#[tokio::test]
async fn progress_events_follow_the_tiers() {
    let sink = Arc::new(RecordingSink::default());
    let engine = ScrapeEngine::with_parts(
        FakeFetcher::failing(FailureKind::Network),
        FakeRenderer::html(&paragraphs(10, "rendered")),
        Arc::new(BlockTextNormalizer),
        sink.clone(),
    );

    engine.run(&config(80)).await.unwrap();

    let events = sink.events.lock().unwrap();
    let summary: Vec<String> = events
        .iter()
        .map(|event| match event {
            EngineEvent::TierStarted { tier } => format!("start {tier}"),
            EngineEvent::TierCompleted { tier, word_count } => format!("done {tier} {word_count}"),
            EngineEvent::TierFailed { tier, .. } => format!("failed {tier}"),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            "start lightweight".to_string(),
            "failed lightweight".to_string(),
            "start rendered".to_string(),
            "done rendered 10".to_string(),
        ]
    );
}

#[test]
fn run_blocking_builds_its_own_runtime_outside_tokio() {
    let fetcher = FakeFetcher::html(&paragraphs(100, "word"));
    let report = run_blocking(
        engine(fetcher.clone(), FakeRenderer::html("")),
        config(80),
    )
    .unwrap();

    assert_eq!(report.winner.tier, Tier::Lightweight);
    assert_eq!(report.winner.word_count, 100);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_blocking_inside_a_runtime_uses_a_dedicated_thread() {
    let renderer = FakeRenderer::html(&paragraphs(200, "rendered"));
    let report = run_blocking(
        engine(FakeFetcher::html(&paragraphs(100, "word")), renderer.clone()),
        config(120),
    )
    .unwrap();

    assert_eq!(report.escalation, EscalationReason::BelowThreshold);
    assert_eq!(report.winner.tier, Tier::Rendered);
    assert_eq!(report.winner.word_count, 200);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}
