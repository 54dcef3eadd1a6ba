use std::sync::OnceLock;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

pub trait Normalizer: Send + Sync {
    fn normalize(&self, html: &str) -> String;
}

/// Flattens markup to one line per text block:
/// - keeps `<p>`, `<ul>`, `<ol>` and `<pre>` in document order
/// - drops lists and `<pre>` nested inside a `<p>` (their text is already in the paragraph)
/// - collapses whitespace inside each block and skips blocks with no text.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockTextNormalizer;

fn block_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("p, ul, ol, pre").ok())
        .as_ref()
}

impl Normalizer for BlockTextNormalizer {
    fn normalize(&self, html: &str) -> String {
        let Some(selector) = block_selector() else {
            return String::new();
        };
        let doc = Html::parse_document(html);
        doc.select(selector)
            .filter(|el| el.value().name() == "p" || !inside_paragraph(*el))
            .map(block_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn inside_paragraph(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node: NodeRef<'_, Node>| {
        node.value()
            .as_element()
            .is_some_and(|el| el.name() == "p")
    })
}

/// Text nodes joined by a single space, then whitespace-collapsed.
fn block_text(element: ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&joined)
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
