//! Build a webhook payload from a raw RFC 5322 message (`.eml` capture).

use std::path::Path;

use mail_parser::{Addr, Address, MessageParser};

use crate::error::{IntakeError, Result};
use crate::model::payload::{InboundEmailPayload, Recipient};

/// Parse a raw message into the same shape the inbound webhook delivers.
///
/// `StrippedTextReply` is computed by the webhook provider and cannot be
/// recovered from a raw message, so it is left empty.
pub fn payload_from_eml(raw: &[u8]) -> Result<InboundEmailPayload> {
    let msg = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| IntakeError::InvalidEml("not an RFC 5322 message".into()))?;

    let from = msg.from().map(addresses).unwrap_or_default();
    let from_full = from
        .first()
        .map(|a| recipient(a))
        .ok_or_else(|| IntakeError::InvalidEml("missing From address".into()))?;

    let to = msg.to().map(addresses).unwrap_or_default();
    let bcc = msg.bcc().map(addresses).unwrap_or_default();

    let payload = InboundEmailPayload {
        from: (!from.is_empty()).then(|| join_addresses(&from)),
        to: (!to.is_empty()).then(|| join_addresses(&to)),
        to_full: (!to.is_empty()).then(|| to.iter().map(|a| recipient(a)).collect()),
        from_full,
        date: msg.date().map(|d| d.to_rfc3339()),
        subject: msg.subject().map(str::to_string),
        bcc: (!bcc.is_empty()).then(|| join_addresses(&bcc)),
        stripped_text_reply: None,
        text_body: msg.body_text(0).map(|s| s.into_owned()),
        html_body: msg.body_html(0).map(|s| s.into_owned()),
    };
    payload.validate()?;
    Ok(payload)
}

/// Read and convert an `.eml` file.
pub fn payload_from_eml_file(path: impl AsRef<Path>) -> Result<InboundEmailPayload> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IntakeError::FileNotFound(path.to_path_buf())
        } else {
            IntakeError::io(path, e)
        }
    })?;
    payload_from_eml(&data)
}

/// Flatten plain lists and groups into one address list.
fn addresses<'a, 'x>(address: &'a Address<'x>) -> Vec<&'a Addr<'x>> {
    match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    }
}

fn recipient(addr: &Addr<'_>) -> Recipient {
    Recipient {
        email: addr.address.as_deref().unwrap_or_default().to_string(),
        name: addr.name.as_deref().map(str::to_string),
    }
}

/// Render addresses back into a header-style `Name <email>, ...` string.
fn join_addresses(list: &[&Addr<'_>]) -> String {
    list.iter()
        .map(|a| match (a.name.as_deref(), a.address.as_deref()) {
            (Some(name), Some(email)) => format!("\"{name}\" <{email}>"),
            (None, Some(email)) => email.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
