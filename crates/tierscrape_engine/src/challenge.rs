//! Detection of anti-bot interstitials served in place of the page.
use reqwest::header::{HeaderMap, SERVER};

const CHALLENGE_STATUSES: [u16; 3] = [403, 429, 503];

/// Markers that only appear on challenge pages.
const STRONG_MARKERS: [&str; 3] = ["cf-browser-verification", "cf_chl_opt", "challenge-platform"];
const TITLE_MARKER: &str = "<title>Just a moment...</title>";

pub fn is_challenge(status: u16, headers: &HeaderMap, body: &str) -> bool {
    let mitigated = headers
        .get("cf-mitigated")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("challenge"));
    if mitigated {
        return true;
    }

    let strong_marker = STRONG_MARKERS.iter().any(|marker| body.contains(marker));
    if CHALLENGE_STATUSES.contains(&status) {
        let cloudflare = headers
            .get(SERVER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("cloudflare"));
        return cloudflare && (strong_marker || body.contains(TITLE_MARKER));
    }

    // A 200 interstitial needs both the title and a challenge script marker.
    strong_marker && body.contains(TITLE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn cloudflare_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("cloudflare"));
        headers
    }

    #[test]
    fn mitigated_header_is_enough() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-mitigated", HeaderValue::from_static("challenge"));
        assert!(is_challenge(403, &headers, ""));
    }

    #[test]
    fn cloudflare_503_with_title_is_a_challenge() {
        let body = "<html><head><title>Just a moment...</title></head></html>";
        assert!(is_challenge(503, &cloudflare_headers(), body));
        assert!(!is_challenge(503, &HeaderMap::new(), body));
    }

    #[test]
    fn plain_forbidden_is_not_a_challenge() {
        assert!(!is_challenge(403, &cloudflare_headers(), "<h1>Forbidden</h1>"));
    }

    #[test]
    fn ordinary_page_mentioning_the_phrase_is_not_a_challenge() {
        let body = "<p>Just a moment... while we talk about challenge-platform design</p>";
        assert!(!is_challenge(200, &HeaderMap::new(), body));
    }
}
