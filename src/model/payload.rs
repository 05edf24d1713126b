//! Inbound-email webhook payload (Postmark inbound JSON shape).

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};

/// One `{Email, Name}` entry of `FromFull` / `ToFull`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The subset of the webhook body the classifier reads.
///
/// Unknown keys (`Headers`, `Attachments`, `MessageID`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundEmailPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_full: Option<Vec<Recipient>>,
    pub from_full: Recipient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripped_text_reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
}

impl InboundEmailPayload {
    /// Deserialize and validate a webhook body.
    pub fn from_json(json: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(json)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Read a payload from a file, or from stdin when `path` is `-`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = read_input(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Check the invariants the upstream webhook schema guarantees.
    pub fn validate(&self) -> Result<()> {
        if !email_address::EmailAddress::is_valid(self.from_full.email.trim()) {
            return Err(IntakeError::InvalidPayload(format!(
                "FromFull.Email is not a valid address: '{}'",
                self.from_full.email
            )));
        }
        Ok(())
    }

    /// `true` when the inbound mailbox was BCC'd rather than forwarded to.
    pub fn is_bcc(&self) -> bool {
        self.bcc.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    /// The body to work on: text if non-empty, else HTML if non-empty, else `""`.
    ///
    /// HTML is returned as-is; markup is not stripped.
    pub fn effective_body(&self) -> &str {
        [self.text_body.as_deref(), self.html_body.as_deref()]
            .into_iter()
            .flatten()
            .find(|b| !b.is_empty())
            .unwrap_or("")
    }
}

/// Read a whole input file as UTF-8, treating `-` as stdin.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| IntakeError::io(path, e))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IntakeError::FileNotFound(path.to_path_buf())
        } else {
            IntakeError::io(path, e)
        }
    })
}
