use std::fmt;

use serde::Serialize;
use url::Url;

use crate::{validate_url, InputError};

pub const DEFAULT_WORD_THRESHOLD: u32 = 80;

/// Browser engine families the rendering tier can present as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    /// Maps a human browser name ("Chrome", "Safari", ...) onto an engine family.
    pub fn from_name(name: &str) -> Result<Self, InputError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" | "brave" | "microsoft edge" | "edge" | "opera" | "vivaldi" => {
                Ok(BrowserKind::Chromium)
            }
            "firefox" | "librewolf" => Ok(BrowserKind::Firefox),
            "safari" => Ok(BrowserKind::Webkit),
            _ => Err(InputError::UnsupportedBrowser(name.to_string())),
        }
    }

    /// Fixed user agent presented when no override is configured.
    pub fn default_user_agent(self) -> &'static str {
        match self {
            BrowserKind::Chromium => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            }
            BrowserKind::Firefox => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0"
            }
            BrowserKind::Webkit => {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_3) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/16.4 Safari/605.1.15"
            }
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::Chromium => write!(f, "chromium"),
            BrowserKind::Firefox => write!(f, "firefox"),
            BrowserKind::Webkit => write!(f, "webkit"),
        }
    }
}

/// Immutable input for one run. Only constructible from a validated URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    url: Url,
    word_threshold: u32,
    browser: BrowserKind,
    user_agent: Option<String>,
    content_only: bool,
}

impl ScrapeConfig {
    pub fn new(url: &str, browser_name: &str) -> Result<Self, InputError> {
        let url = validate_url(url)?;
        let browser = BrowserKind::from_name(browser_name)?;
        Ok(Self {
            url,
            word_threshold: DEFAULT_WORD_THRESHOLD,
            browser,
            user_agent: None,
            content_only: false,
        })
    }

    pub fn with_word_threshold(mut self, threshold: u32) -> Self {
        self.word_threshold = threshold;
        self
    }

    /// Blank overrides are ignored so an empty env var does not wipe the user agent.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent.filter(|ua| !ua.trim().is_empty());
        self
    }

    pub fn with_content_only(mut self, content_only: bool) -> Self {
        self.content_only = content_only;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn word_threshold(&self) -> u32 {
        self.word_threshold
    }

    pub fn browser(&self) -> BrowserKind {
        self.browser
    }

    pub fn user_agent_override(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn content_only(&self) -> bool {
        self.content_only
    }
}
