//! Forwarded-message block detection inside a plain email body.
//!
//! A body may contain several forwarded blocks (a forward of a forward, or
//! several messages forwarded in sequence). Each block starts at a marker
//! line such as `---------- Forwarded message ---------` and runs until the
//! next marker or the end of the text.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::model::parsed::ForwardedMessage;
use crate::parser::header::parse_header_cluster;

/// Block-start markers, English first, then Norwegian Bokmål.
const MARKER_PATTERNS: &[&str] = &[
    r"(?im)^[ \t]*-*[ \t]*forwarded message[ \t]*-*[ \t]*$",
    r"(?im)^[ \t]*begin forwarded message:[ \t]*$",
    r"(?im)^-{2,}[ \t]*forwarded message[ \t]*-{2,}",
    r"(?im)^[ \t]*-*[ \t]*videresendt melding[ \t]*-*[ \t]*$",
    r"(?im)^[ \t]*begynn videresendt melding:[ \t]*$",
    r"(?im)^-{2,}[ \t]*videresendt melding[ \t]*-{2,}",
];

fn marker_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        MARKER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid forward marker regex"))
            .collect()
    })
}

fn from_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?im)^(?:from|fra):").expect("valid From line regex"))
}

/// `true` if the whole line is a forward marker.
pub fn is_marker_line(line: &str) -> bool {
    marker_regexes().iter().any(|re| re.is_match(line))
}

/// Byte offsets where forwarded blocks start, ascending and deduplicated.
///
/// Without any marker, the first line starting with `From:` / `Fra:` is
/// taken as the start of a single block.
pub fn find_block_starts(text: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = marker_regexes()
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.start()))
        .collect();
    starts.sort_unstable();
    starts.dedup();

    if starts.is_empty() {
        if let Some(m) = from_line_regex().find(text) {
            debug!(offset = m.start(), "No forward marker, using From: heuristic");
            starts.push(m.start());
        }
    }

    starts
}

/// Extract every forwarded block from `body`, in document order.
///
/// Blocks without a single `key: value` header line are skipped. An empty
/// result is a normal outcome, not an error.
pub fn extract_forwarded_messages(body: &str) -> Vec<ForwardedMessage> {
    let text: Cow<'_, str> = if body.contains('\r') {
        Cow::Owned(body.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(body)
    };

    let starts = find_block_starts(&text);
    let mut messages = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        if let Some(message) = parse_block(&text[start..end]) {
            messages.push(message);
        }
    }

    debug!(
        markers = starts.len(),
        blocks = messages.len(),
        "Extracted forwarded blocks"
    );
    messages
}

/// Parse one block: optional marker line, header cluster, blank line, body.
fn parse_block(block: &str) -> Option<ForwardedMessage> {
    let mut lines = block.lines().peekable();

    if lines.peek().is_some_and(|first| is_marker_line(first)) {
        lines.next();
    }

    let mut header_lines = Vec::new();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        header_lines.push(line);
    }

    let headers = parse_header_cluster(header_lines);
    if headers.is_empty() {
        return None;
    }

    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Some(ForwardedMessage { headers, body })
}
