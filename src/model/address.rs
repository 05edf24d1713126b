//! Loose address extraction for header-style strings.
//!
//! Not an RFC 5322 parser: bracketed text if present, otherwise the whole entry.

use serde::Serialize;

/// One address-list entry split into a display name and an email.
///
/// # Examples
/// - `"Kunde Knutsen <kunde@firma.com>"` → `name = Some("Kunde Knutsen")`, `email = Some("kunde@firma.com")`
/// - `"kunde@firma.com"` → `name = None`, `email = Some("kunde@firma.com")`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Display name in front of the angle brackets, quotes stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The extracted email. Not validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The entry exactly as it was given.
    pub raw: String,
}

impl ParsedAddress {
    /// Parse a single address entry.
    ///
    /// If `<...>` is present the bracket contents are the email and the text
    /// before it is the name; otherwise the trimmed entry is the email as-is.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(open) = trimmed.find('<') {
            if let Some(len) = trimmed[open + 1..].find('>') {
                let email = trimmed[open + 1..open + 1 + len].trim();
                let name = strip_quotes(&trimmed[..open]);
                return Self {
                    name: (!name.is_empty()).then_some(name),
                    email: (!email.is_empty()).then(|| email.to_string()),
                    raw: raw.to_string(),
                };
            }
        }

        Self {
            name: None,
            email: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            raw: raw.to_string(),
        }
    }

    /// Parse the first comma-separated entry of a header value.
    ///
    /// The split is naive: a quoted display name containing a comma is cut
    /// at that comma.
    pub fn parse_first(raw: &str) -> Self {
        Self::parse(raw.split(',').next().unwrap_or(""))
    }

    /// Shorthand for the email of [`ParsedAddress::parse_first`].
    pub fn first_email(raw: &str) -> Option<String> {
        Self::parse_first(raw).email
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => write!(f, "{name} <{email}>"),
            (None, Some(email)) => write!(f, "{email}"),
            _ => write!(f, "{}", self.raw.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let addr = ParsedAddress::parse("trygve@kodemaker.no");
        assert_eq!(addr.email.as_deref(), Some("trygve@kodemaker.no"));
        assert_eq!(addr.name, None);
    }

    #[test]
    fn test_parse_quoted_name_and_address() {
        let addr = ParsedAddress::parse("\"Kunde Knutsen\" <kunde.knutsen@firma.com>");
        assert_eq!(addr.email.as_deref(), Some("kunde.knutsen@firma.com"));
        assert_eq!(addr.name.as_deref(), Some("Kunde Knutsen"));
        assert_eq!(addr.raw, "\"Kunde Knutsen\" <kunde.knutsen@firma.com>");
    }

    #[test]
    fn test_parse_angle_only() {
        let addr = ParsedAddress::parse("  < kunde@firma.com >  ");
        assert_eq!(addr.email.as_deref(), Some("kunde@firma.com"));
        assert_eq!(addr.name, None);
    }

    #[test]
    fn test_parse_unclosed_bracket_falls_back_to_whole_entry() {
        let addr = ParsedAddress::parse("Kunde <kunde@firma.com");
        assert_eq!(addr.email.as_deref(), Some("Kunde <kunde@firma.com"));
    }

    #[test]
    fn test_parse_garbage_is_passed_through() {
        let addr = ParsedAddress::parse("not an address");
        assert_eq!(addr.email.as_deref(), Some("not an address"));
    }

    #[test]
    fn test_parse_empty() {
        let addr = ParsedAddress::parse("   ");
        assert_eq!(addr.email, None);
        assert_eq!(addr.name, None);
    }

    #[test]
    fn test_first_email_takes_first_entry() {
        assert_eq!(
            ParsedAddress::first_email("A <a@b.com>, C <c@d.com>").as_deref(),
            Some("a@b.com")
        );
        assert_eq!(
            ParsedAddress::first_email("plain@addr.com, other@addr.com").as_deref(),
            Some("plain@addr.com")
        );
        assert_eq!(ParsedAddress::first_email(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ParsedAddress::parse("Alice <alice@example.com>").to_string(),
            "Alice <alice@example.com>"
        );
        assert_eq!(
            ParsedAddress::parse("alice@example.com").to_string(),
            "alice@example.com"
        );
    }
}
