use std::sync::{Arc, Mutex};
use std::time::Duration;

use tierscrape_core::{FailureKind, FetchError};
use tierscrape_engine::{navigate_within, settle, EngineEvent, ProgressSink};

#[derive(Default, Clone)]
struct TickSink {
    ticks: Arc<Mutex<Vec<Duration>>>,
}

impl ProgressSink for TickSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::Settling { elapsed, .. } = event {
            self.ticks.lock().unwrap().push(elapsed);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn navigation_that_never_finishes_times_out() {
    let never = std::future::pending::<Result<(), FetchError>>();
    let err = navigate_within(Duration::from_secs(60), never).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NavigationTimeout);
    assert!(err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn quick_navigation_wins_the_race() {
    let started = tokio::time::Instant::now();
    let value = navigate_within(Duration::from_secs(60), async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<_, FetchError>("loaded")
    })
    .await
    .unwrap();
    assert_eq!(value, "loaded");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn navigation_errors_pass_through() {
    let err = navigate_within(Duration::from_secs(60), async {
        Err::<(), _>(FetchError::new(FailureKind::Driver, "net::ERR_NAME_NOT_RESOLVED"))
    })
    .await
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::Driver);
}

#[tokio::test(start_paused = true)]
async fn settle_waits_full_duration_and_ticks_each_second() {
    let sink = TickSink::default();
    let started = tokio::time::Instant::now();

    settle(
        Duration::from_secs(60),
        Duration::from_secs(1),
        &sink,
        std::future::pending(),
    )
    .await
    .expect("settled");

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
    let ticks = sink.ticks.lock().unwrap().clone();
    assert!((59..=60).contains(&ticks.len()), "got {} ticks", ticks.len());
    assert!(ticks[0] >= Duration::from_secs(1) && ticks[0] < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn browser_disconnect_cuts_the_settle_short() {
    let sink = TickSink::default();
    let started = tokio::time::Instant::now();

    let err = settle(
        Duration::from_secs(60),
        Duration::from_secs(1),
        &sink,
        tokio::time::sleep(Duration::from_millis(5_500)),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::Driver);
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(sink.ticks.lock().unwrap().len(), 5);
}
