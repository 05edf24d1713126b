//! Header clusters inside forwarded blocks: folding and alias normalization.

use crate::model::parsed::ForwardedBlockHeaders;

/// Canonical header key → accepted spellings (English and Norwegian Bokmål).
pub const HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("from", &["from", "fra"]),
    ("to", &["to", "til"]),
    ("cc", &["cc", "kopi"]),
    ("date", &["date", "dato", "sendt"]),
    ("subject", &["subject", "emne"]),
];

/// Map a raw header name to its canonical key.
///
/// The name is trimmed and lowercased; names outside [`HEADER_ALIASES`]
/// come back lowercased but otherwise unchanged.
pub fn canonical_key(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    HEADER_ALIASES
        .iter()
        .find(|(_, spellings)| spellings.contains(&key.as_str()))
        .map(|(canonical, _)| (*canonical).to_string())
        .unwrap_or(key)
}

/// Unfold header lines: a line starting with space or tab continues the previous one.
pub fn unfold_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for line in lines {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
                *last = last.trim().to_string();
                continue;
            }
        }
        result.push(line.trim().to_string());
    }

    result
}

/// Split `key: value` on the first colon. Returns `None` for lines without one
/// or with an empty key.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = line[..colon].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[colon + 1..].trim()))
}

/// Parse raw header lines (before the blank line) into canonical headers.
///
/// Lines that are not `key: value` are skipped.
pub fn parse_header_cluster<'a>(lines: impl IntoIterator<Item = &'a str>) -> ForwardedBlockHeaders {
    let mut headers = ForwardedBlockHeaders::default();
    for line in unfold_lines(lines) {
        if let Some((key, value)) = split_header_line(&line) {
            headers.insert(&canonical_key(key), value);
        }
    }
    headers
}
