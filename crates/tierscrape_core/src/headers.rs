use crate::ScrapeConfig;

/// Header fields sent by both tiers regardless of browser kind.
pub const STATIC_HEADERS: [(&str, &str); 4] = [
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Referer", "https://www.google.com/"),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Connection", "keep-alive"),
];

/// Headers for one fetch attempt. Built fresh per attempt from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBundle {
    user_agent: String,
}

impl HeaderBundle {
    pub fn for_config(config: &ScrapeConfig) -> Self {
        let user_agent = config
            .user_agent_override()
            .map(str::to_string)
            .unwrap_or_else(|| config.browser().default_user_agent().to_string());
        Self { user_agent }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn accept_language(&self) -> &'static str {
        STATIC_HEADERS[0].1
    }

    /// Static fields without the user agent (the browser context sets that itself).
    pub fn static_headers(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        STATIC_HEADERS.into_iter()
    }

    /// Static fields plus `User-Agent`, as sent on a raw HTTP request.
    pub fn with_user_agent(&self) -> Vec<(&'static str, String)> {
        let mut headers: Vec<(&'static str, String)> = self
            .static_headers()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        headers.push(("User-Agent", self.user_agent.clone()));
        headers
    }
}
