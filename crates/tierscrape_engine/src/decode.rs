use std::sync::OnceLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use scraper::{Html, Selector};

const META_SNIFF_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static str,
    /// Malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode a response body into UTF-8.
///
/// Order: BOM -> Content-Type charset -> `<meta charset>` in the first KiB ->
/// chardetng guess hinted by the host's TLD. Never fails; bad bytes are replaced.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>, host: Option<&str>) -> DecodedPage {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    if let Some(enc) = sniff_meta_charset(bytes) {
        return decode_with(bytes, enc);
    }

    let tld = host.and_then(|h| h.rsplit('.').next()).map(str::as_bytes);
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(tld, true))
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn meta_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("meta[charset]").ok())
        .as_ref()
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let (head, _, _) = encoding_rs::WINDOWS_1252.decode(head);
    let selector = meta_selector()?;
    let doc = Html::parse_document(&head);
    let label = doc
        .select(selector)
        .find_map(|meta| meta.value().attr("charset"))?;
    Encoding::for_label(label.trim().as_bytes())
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedPage {
    let (text, actual, had_errors) = enc.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding: actual.name(),
        had_errors,
    }
}
