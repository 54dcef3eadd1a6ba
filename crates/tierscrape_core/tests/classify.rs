use tierscrape_core::{classify, is_junk_token, FetchOutcome, JunkVerdict, Tier};

fn outcome(text: &str) -> FetchOutcome {
    FetchOutcome::from_text(Tier::Lightweight, text.to_string())
}

fn prose(words: usize) -> String {
    const WORDS: [&str; 8] = ["the", "river", "flows", "quietly", "past", "old", "stone", "houses"];
    (0..words)
        .map(|i| WORDS[i % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn plain_prose_above_threshold_is_clean() {
    let report = classify(&outcome(&prose(120)), 80);
    assert_eq!(report.verdict, JunkVerdict::Clean);
    assert_eq!(report.junk_tokens, 0);
    assert_eq!(report.total_tokens, 120);
}

#[test]
fn class_name_soup_is_junk() {
    let report = classify(&outcome("css-a1b2 mui-Button-root data-x aria-hidden"), 80);
    assert_eq!(report.verdict, JunkVerdict::Junk);
    assert_eq!(report.junk_tokens, 4);
    assert!(report.junk_ratio > 0.99);
}

#[test]
fn forty_percent_junk_tokens_is_junk_even_when_long() {
    let mut tokens = Vec::new();
    for i in 0..200 {
        if i % 5 < 2 {
            tokens.push("css-1x2y3z".to_string());
        } else {
            tokens.push("word".to_string());
        }
    }
    let report = classify(&outcome(&tokens.join(" ")), 80);
    assert_eq!(report.junk_tokens, 80);
    assert_eq!(report.verdict, JunkVerdict::Junk);
}

#[test]
fn short_text_with_few_clean_words_is_junk() {
    // 20 words: 20 - 0 < 0.75 * 80
    let report = classify(&outcome(&prose(20)), 80);
    assert_eq!(report.verdict, JunkVerdict::Junk);
}

#[test]
fn tiny_text_skips_the_clean_word_check() {
    let report = classify(&outcome("just a few words"), 80);
    assert_eq!(report.verdict, JunkVerdict::Clean);
}

#[test]
fn empty_outcome_is_never_junk() {
    let report = classify(&FetchOutcome::empty(Tier::Lightweight), 80);
    assert_eq!(report.verdict, JunkVerdict::Clean);
    assert_eq!(report.total_tokens, 0);
}

#[test]
fn token_shapes() {
    assert!(is_junk_token("aria-label"));
    assert!(is_junk_token("MuiTypography-root"));
    assert!(is_junk_token("btn-primary-large"));
    assert!(is_junk_token("color:red;"));
    assert!(is_junk_token("display:none;"));
    assert!(!is_junk_token("well-known"));
    assert!(!is_junk_token("Hello"));
    assert!(!is_junk_token("note:"));
}
