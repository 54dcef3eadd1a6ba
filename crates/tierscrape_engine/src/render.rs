//! Rendering tier: loads the page in headless Chromium and reads the settled DOM.
//!
//! Every call launches its own browser process and closes it before returning,
//! whether the render succeeded or not.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use engine_logging::{engine_debug, engine_warn};
use futures_util::{Stream, StreamExt};
use tierscrape_core::{BrowserKind, FailureKind, FetchError, HeaderBundle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use url::Url;

use crate::{EngineEvent, ProgressSink};

const BROWSER_NAMES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Resolves once `DOMContentLoaded` has fired (or immediately if it already has).
const DOM_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState !== 'loading') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub navigation_timeout: Duration,
    pub settle: Duration,
    pub progress_interval: Duration,
    pub executable: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            settle: Duration::from_secs(60),
            progress_interval: Duration::from_secs(1),
            executable: None,
        }
    }
}

#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the rendered markup of `url` after the settle wait.
    async fn render(
        &self,
        url: &Url,
        browser: BrowserKind,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
    ) -> Result<String, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    settings: RenderSettings,
}

impl ChromiumRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    fn executable(&self) -> Result<PathBuf, FetchError> {
        if let Some(path) = &self.settings.executable {
            return Ok(path.clone());
        }
        find_chromium().ok_or_else(|| {
            FetchError::new(
                FailureKind::Driver,
                "no Chromium-based browser found; pass --browser-path",
            )
        })
    }

    async fn drive_page(
        &self,
        browser: &Browser,
        url: &Url,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
        handler_task: &mut AbortOnDropHandle<()>,
    ) -> Result<String, FetchError> {
        let page = browser.new_page("about:blank").await.map_err(driver_error)?;
        let result = self
            .load_and_settle(&page, url, headers, sink, handler_task)
            .await;
        if let Err(err) = page.close().await {
            engine_debug!("closing page failed: {err}");
        }
        result
    }

    async fn load_and_settle(
        &self,
        page: &Page,
        url: &Url,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
        handler_task: &mut AbortOnDropHandle<()>,
    ) -> Result<String, FetchError> {
        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(headers.user_agent())
            .accept_language(headers.accept_language())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Driver, err))?;
        page.execute(user_agent).await.map_err(driver_error)?;

        let extra: serde_json::Map<String, serde_json::Value> = headers
            .static_headers()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("connection"))
            .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
            .collect();
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            serde_json::Value::Object(extra),
        )))
        .await
        .map_err(driver_error)?;

        let started = Instant::now();
        navigate_within(self.settings.navigation_timeout, navigate(page, url)).await?;
        sink.emit(EngineEvent::Navigated {
            elapsed: started.elapsed(),
        });

        let disconnected = async {
            let _ = (&mut *handler_task).await;
        };
        settle(
            self.settings.settle,
            self.settings.progress_interval,
            sink,
            disconnected,
        )
        .await?;

        page.content().await.map_err(driver_error)
    }
}

#[async_trait::async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &Url,
        browser_kind: BrowserKind,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
    ) -> Result<String, FetchError> {
        if browser_kind != BrowserKind::Chromium {
            engine_warn!(
                "{browser_kind} is rendered with the Chromium engine using its own user agent"
            );
        }

        let config = BrowserConfig::builder()
            .chrome_executable(self.executable()?)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .request_timeout(self.settings.navigation_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Driver, err))?;

        let (mut browser, handler) = Browser::launch(config).await.map_err(driver_error)?;
        let mut handler_task = drain_events(handler);

        let result = self
            .drive_page(&browser, url, headers, sink, &mut handler_task)
            .await;

        if let Err(err) = browser.close().await {
            engine_debug!("closing browser failed: {err}");
        }
        if let Err(err) = browser.wait().await {
            engine_debug!("waiting for browser exit failed: {err}");
        }
        handler_task.abort();
        result
    }
}

async fn navigate(page: &Page, url: &Url) -> Result<(), FetchError> {
    let params = NavigateParams::builder()
        .url(url.as_str())
        .build()
        .map_err(|err| FetchError::new(FailureKind::Driver, err))?;
    let response = page.execute(params).await.map_err(driver_error)?;
    if let Some(error_text) = response.result.error_text.as_deref() {
        return Err(FetchError::new(
            FailureKind::Driver,
            format!("navigation to {url} failed: {error_text}"),
        ));
    }

    if let Err(err) = page.evaluate(DOM_READY_SCRIPT.to_string()).await {
        // A late redirect can destroy the context the script ran in; the new one is loading.
        engine_debug!("DOM ready probe failed: {err}");
    }
    Ok(())
}

/// Drives the browser's event stream until it ends or the returned handle is dropped.
fn drain_events<S>(events: S) -> AbortOnDropHandle<()>
where
    S: Stream + Send + 'static,
{
    AbortOnDropHandle::new(tokio::spawn(async move {
        let mut events = std::pin::pin!(events);
        while events.next().await.is_some() {}
    }))
}

/// Races a navigation against its timeout; the timer is dropped as soon as navigation wins.
pub async fn navigate_within<F, T>(timeout: Duration, navigation: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, navigation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::new(
            FailureKind::NavigationTimeout,
            format!("navigation did not finish within {}s", timeout.as_secs()),
        )),
    }
}

/// Waits `total` while a ticker reports elapsed time every `every`.
///
/// The ticker is cancelled when the wait ends; `disconnected` resolving first
/// aborts the wait with a driver error.
pub async fn settle<D>(
    total: Duration,
    every: Duration,
    sink: &dyn ProgressSink,
    disconnected: D,
) -> Result<(), FetchError>
where
    D: Future<Output = ()>,
{
    let start = Instant::now();
    let cancel = CancellationToken::new();

    let ticker = async {
        let mut interval = tokio::time::interval_at(start + every, every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => sink.emit(EngineEvent::Settling {
                    elapsed: start.elapsed(),
                    total,
                }),
            }
        }
    };

    let wait = async {
        let result = tokio::select! {
            _ = tokio::time::sleep(total) => Ok(()),
            _ = disconnected => Err(FetchError::new(
                FailureKind::Driver,
                "browser disconnected during the settle wait",
            )),
        };
        cancel.cancel();
        result
    };

    let ((), result) = tokio::join!(ticker, wait);
    result
}

/// Looks for a Chromium-family browser on `PATH`, then in the usual macOS location.
pub fn find_chromium() -> Option<PathBuf> {
    if let Some(path) = BROWSER_NAMES.iter().find_map(|name| which::which(name).ok()) {
        return Some(path);
    }

    if cfg!(target_os = "macos") {
        let bundle = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if bundle.exists() {
            return Some(bundle);
        }
    }

    None
}

fn driver_error(err: CdpError) -> FetchError {
    match err {
        CdpError::Timeout => FetchError::new(FailureKind::NavigationTimeout, err.to_string()),
        other => FetchError::new(FailureKind::Driver, other.to_string()),
    }
}
