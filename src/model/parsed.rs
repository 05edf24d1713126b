//! Classifier output types.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::ParseError;
use crate::model::address::ParsedAddress;

/// How the message reached the inbound mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Sent by a CRM user to the customer with the inbound address in BCC.
    #[serde(rename = "BCC")]
    Bcc,
    /// Received by a CRM user and forwarded to the inbound address by hand.
    #[serde(rename = "FORWARDED")]
    Forwarded,
}

impl Mode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bcc => "BCC",
            Self::Forwarded => "FORWARDED",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header values of one forwarded block, keyed by canonical English name.
///
/// Values are the raw strings from the block; addresses are not parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForwardedBlockHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Headers outside the alias table, lowercased key.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

impl ForwardedBlockHeaders {
    /// Record a header under its canonical key.
    ///
    /// A repeated key appends with `", "` instead of overwriting.
    pub fn insert(&mut self, key: &str, value: &str) {
        let slot = match key {
            "from" => &mut self.from,
            "to" => &mut self.to,
            "cc" => &mut self.cc,
            "date" => &mut self.date,
            "subject" => &mut self.subject,
            _ => {
                self.other
                    .entry(key.to_string())
                    .and_modify(|v| {
                        v.push_str(", ");
                        v.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
                return;
            }
        };
        match slot {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => *slot = Some(value.to_string()),
        }
    }

    /// Look a header up by canonical key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "from" => self.from.as_deref(),
            "to" => self.to.as_deref(),
            "cc" => self.cc.as_deref(),
            "date" => self.date.as_deref(),
            "subject" => self.subject.as_deref(),
            _ => self.other.get(key).map(String::as_str),
        }
    }

    /// `true` when no header was recorded.
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.cc.is_none()
            && self.date.is_none()
            && self.subject.is_none()
            && self.other.is_empty()
    }

    /// The original sender of the forwarded message.
    pub fn from_address(&self) -> Option<ParsedAddress> {
        self.from.as_deref().map(ParsedAddress::parse_first)
    }
}

/// One forwarded block: its header cluster and the text after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedMessage {
    pub headers: ForwardedBlockHeaders,
    /// Text after the header-terminating blank line, trimmed.
    pub body: String,
}

/// A successfully classified inbound email.
///
/// Any field but `mode` may be absent; the intake gate decides whether the
/// record is complete enough to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMail {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Text the CRM user wrote above the forward marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_comment: Option<String>,
}

/// Classifier result in its wire form.
///
/// Serializes as the `ParsedMail` object, or as
/// `{"mode": "ERROR", "error": "..."}` on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome(pub std::result::Result<ParsedMail, ParseError>);

impl From<std::result::Result<ParsedMail, ParseError>> for ParseOutcome {
    fn from(result: std::result::Result<ParsedMail, ParseError>) -> Self {
        Self(result)
    }
}

impl Serialize for ParseOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Failure<'a> {
            mode: &'static str,
            error: &'a str,
        }

        match &self.0 {
            Ok(mail) => mail.serialize(serializer),
            Err(err) => {
                let error = err.to_string();
                Failure {
                    mode: "ERROR",
                    error: &error,
                }
                .serialize(serializer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_header_appends() {
        let mut headers = ForwardedBlockHeaders::default();
        headers.insert("to", "a@b.no");
        headers.insert("to", "c@d.no");
        headers.insert("x-mailer", "one");
        headers.insert("x-mailer", "two");
        assert_eq!(headers.get("to"), Some("a@b.no, c@d.no"));
        assert_eq!(headers.get("x-mailer"), Some("one, two"));
        assert!(!headers.is_empty());
    }

    #[test]
    fn test_from_address() {
        let headers = ForwardedBlockHeaders {
            from: Some("Kunde <kunde@firma.com>".into()),
            ..Default::default()
        };
        let addr = headers.from_address().unwrap();
        assert_eq!(addr.email.as_deref(), Some("kunde@firma.com"));
        assert_eq!(addr.name.as_deref(), Some("Kunde"));
    }

    #[test]
    fn test_parsed_mail_serializes_camel_case_without_absent_fields() {
        let mail = ParsedMail {
            mode: Mode::Bcc,
            crm_user: Some("trygve@kodemaker.no".into()),
            contact_email: Some("kunde@firma.com".into()),
            date: None,
            subject: None,
            body: Some("hei".into()),
            forward_comment: None,
        };
        let json = serde_json::to_value(&mail).unwrap();
        assert_eq!(json["mode"], "BCC");
        assert_eq!(json["crmUser"], "trygve@kodemaker.no");
        assert_eq!(json["contactEmail"], "kunde@firma.com");
        assert!(json.get("forwardComment").is_none());
        assert!(json.get("date").is_none());
    }

    #[test]
    fn test_error_outcome_shape() {
        let outcome = ParseOutcome(Err(ParseError::NoForwardedMessages));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "ERROR", "error": "No forwarded messages found"})
        );
    }
}
