use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::InputError;

const URL_PATTERN: &str = concat!(
    r"^https?://",              // scheme
    r"([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}", // dotted host with alphabetic TLD
    r"(:[0-9]+)?",              // port
    r"(/.*)?$",                 // path and query
);

fn url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_PATTERN).ok()).as_ref()
}

/// Accepts absolute http(s) URLs with a dotted host; the browser tier cannot load anything else.
pub fn validate_url(raw: &str) -> Result<Url, InputError> {
    if !url_regex().is_some_and(|re| re.is_match(raw)) {
        return Err(InputError::InvalidUrl(raw.to_string()));
    }
    Url::parse(raw).map_err(|_| InputError::InvalidUrl(raw.to_string()))
}
