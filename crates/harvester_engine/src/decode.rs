use std::sync::LazyLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex::bytes::Regex;

/// How far into a snapshot we look for a `<meta charset>` declaration.
const META_SNIFF_LIMIT: usize = 2_048;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_\-:.]+)"#).expect("static pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub html: String,
    pub encoding_label: String,
    /// Some bytes were not valid in the chosen encoding and were replaced.
    pub lossy: bool,
}

/// Decode a saved page snapshot: BOM, then `<meta charset>`, then chardetng.
///
/// Saved snapshots come from browsers and are sometimes slightly broken, so
/// malformed sequences are replaced instead of failing the whole frame.
pub fn decode_snapshot(bytes: &[u8]) -> DecodedSnapshot {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| declared_charset(bytes))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, lossy) = encoding.decode(bytes);
    DecodedSnapshot {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
        lossy,
    }
}

fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
