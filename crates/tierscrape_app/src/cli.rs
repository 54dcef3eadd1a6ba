use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use engine_logging::Verbosity;
use tierscrape_core::{InputError, ScrapeConfig, DEFAULT_WORD_THRESHOLD};
use tierscrape_engine::{FetchSettings, RenderSettings};

/// Extract the readable text of a web page, escalating to a headless browser when needed.
#[derive(Debug, Parser)]
#[command(name = "tierscrape", version, about)]
pub struct Cli {
    /// Page to scrape (absolute http or https URL).
    #[arg(long, env = "TIERSCRAPE_URL")]
    pub url: String,

    /// Word count below which the rendering tier is tried.
    #[arg(short = 't', long, default_value_t = DEFAULT_WORD_THRESHOLD)]
    pub threshold: u32,

    /// Browser to impersonate (Chrome, Firefox, Safari, Edge, ...).
    #[arg(short = 'b', long, default_value = "Chrome")]
    pub browser: String,

    /// Overrides the browser's default User-Agent string.
    #[arg(long, short_alias = 'u')]
    pub user_agent: Option<String>,

    /// Print only the extracted text and keep the log quiet.
    #[arg(short = 's', long)]
    pub scrape_only: bool,

    /// Print the result as a JSON object.
    #[arg(long, conflicts_with = "scrape_only")]
    pub json: bool,

    /// Chromium executable used by the rendering tier.
    #[arg(long, env = "TIERSCRAPE_BROWSER_PATH")]
    pub browser_path: Option<PathBuf>,

    /// Seconds to let the rendered page run its scripts.
    #[arg(long, default_value_t = 60)]
    pub settle_secs: u64,

    /// Seconds allowed for the browser navigation.
    #[arg(long, default_value_t = 60)]
    pub nav_timeout_secs: u64,

    /// Timeout of the lightweight HTTP request, in seconds.
    #[arg(long, default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Debug logging, including settle ticks.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        match (self.verbose, self.scrape_only) {
            (true, _) => Verbosity::Verbose,
            (false, true) => Verbosity::Silent,
            (false, false) => Verbosity::Normal,
        }
    }

    pub fn scrape_config(&self) -> Result<ScrapeConfig, InputError> {
        Ok(ScrapeConfig::new(&self.url, &self.browser)?
            .with_word_threshold(self.threshold)
            .with_user_agent(self.user_agent.clone())
            .with_content_only(self.scrape_only))
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let timeout = Duration::from_secs(self.http_timeout_secs);
        FetchSettings {
            connect_timeout: timeout,
            request_timeout: timeout,
            ..FetchSettings::default()
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            navigation_timeout: Duration::from_secs(self.nav_timeout_secs),
            settle: Duration::from_secs(self.settle_secs),
            executable: self.browser_path.clone(),
            ..RenderSettings::default()
        }
    }
}
