use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tierscrape_core::{FailureKind, FetchError, HeaderBundle};
use url::Url;

use crate::challenge::is_challenge;
use crate::decode::decode_page;
use crate::{EngineEvent, ProgressSink};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            redirect_limit: 10,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Decoded response of the lightweight tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub final_url: String,
    pub status: u16,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub encoding: &'static str,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
    ) -> Result<RawPage, FetchError>;
}

/// Single-GET fetcher. Builds a fresh client per call so nothing outlives the attempt.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(
        &self,
        headers: HeaderMap,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        // Clearance cookies must survive the redirect chain.
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Unexpected, err.to_string()))
    }

    async fn read_body(
        &self,
        response: reqwest::Response,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
            sink.emit(EngineEvent::Downloading {
                bytes: bytes.len() as u64,
            });
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderBundle,
        sink: &dyn ProgressSink,
    ) -> Result<RawPage, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(header_map(headers)?, redirect_counter.clone())?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let final_url = response.url().clone();
        let content_type = response_headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = self.read_body(response, sink).await?;
        let decoded = decode_page(&bytes, content_type.as_deref(), final_url.host_str());

        if is_challenge(status.as_u16(), &response_headers, &decoded.html) {
            return Err(FetchError::new(
                FailureKind::Challenge,
                format!("anti-bot challenge served by {final_url} (status {status})"),
            ));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        Ok(RawPage {
            final_url: final_url.to_string(),
            status: status.as_u16(),
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            encoding: decoded.encoding,
            html: decoded.html,
        })
    }
}

fn header_map(bundle: &HeaderBundle) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::new();
    for (name, value) in bundle.with_user_agent() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| FetchError::new(FailureKind::Unexpected, err.to_string()))?;
        let value = HeaderValue::from_str(&value).map_err(|err| {
            FetchError::new(
                FailureKind::Unexpected,
                format!("invalid value for header {name}: {err}"),
            )
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::Unexpected, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
