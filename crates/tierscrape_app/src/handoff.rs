use tierscrape_core::{RunReport, ScrapeConfig};

/// Formats the winning outcome for stdout.
///
/// Content-only mode prints the bare text. JSON mode serialises the whole
/// report. Otherwise a short header precedes the text.
pub fn render_handoff(
    report: &RunReport,
    config: &ScrapeConfig,
    json: bool,
) -> serde_json::Result<String> {
    if config.content_only() {
        return Ok(report.winner.text.clone());
    }
    if json {
        return serde_json::to_string_pretty(report);
    }
    Ok(format!(
        "tier: {}\nword_count: {}\nescalation: {}\n\n{}",
        report.winner.tier, report.winner.word_count, report.escalation, report.winner.text
    ))
}
