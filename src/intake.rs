//! Completeness checks between classification and persistence.
//!
//! The classifier happily returns records with absent fields. Before a
//! record can be linked to a contact and a user it has to pass this gate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::IntakeConfig;
use crate::error::ParseError;
use crate::model::parsed::{Mode, ParsedMail};
use crate::parser::date::parse_date;

/// Why a classified email cannot be stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Could not determine the contact's email address")]
    MissingContactEmail,

    #[error("Could not determine the message body")]
    MissingBody,

    #[error("Could not determine the sending CRM user")]
    MissingCrmUser,

    #[error("Contact email is not a valid address: '{0}'")]
    InvalidContactEmail(String),

    #[error("Sender '{0}' is not a known CRM user")]
    UnknownCrmUser(String),
}

/// Which senders may create records.
#[derive(Debug, Clone, Default)]
pub struct IntakePolicy {
    known_users: HashSet<String>,
    require_known_user: bool,
}

impl IntakePolicy {
    /// Accept any sender.
    pub fn open() -> Self {
        Self::default()
    }

    /// Only accept the listed senders (case-insensitive).
    pub fn known_users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known_users: users
                .into_iter()
                .map(|u| u.as_ref().trim().to_lowercase())
                .collect(),
            require_known_user: true,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        if config.require_known_user {
            Self::known_users(&config.known_users)
        } else {
            Self::open()
        }
    }

    fn allows(&self, crm_user: &str) -> bool {
        !self.require_known_user || self.known_users.contains(crm_user)
    }
}

/// A classified email with every field persistence needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedMail {
    pub mode: Mode,
    pub crm_user: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_comment: Option<String>,
    /// The outer `Date` header as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// `date` parsed to UTC, when it could be.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

/// Gate one classifier result.
///
/// Checks run in a fixed order (parse error, contact, body, sender) so the
/// caller always reports the same missing piece for the same input.
pub fn accept(
    outcome: Result<ParsedMail, ParseError>,
    policy: &IntakePolicy,
) -> Result<AcceptedMail, Rejection> {
    let mail = outcome?;

    let contact_email =
        non_empty(mail.contact_email).ok_or(Rejection::MissingContactEmail)?;
    let body = non_empty(mail.body).ok_or(Rejection::MissingBody)?;
    let crm_user = non_empty(mail.crm_user).ok_or(Rejection::MissingCrmUser)?;

    if !email_address::EmailAddress::is_valid(&contact_email) {
        return Err(Rejection::InvalidContactEmail(contact_email));
    }

    let crm_user = crm_user.to_lowercase();
    if !policy.allows(&crm_user) {
        tracing::info!(crm_user = %crm_user, "Rejected mail from unknown sender");
        return Err(Rejection::UnknownCrmUser(crm_user));
    }

    let received_at = mail.date.as_deref().and_then(parse_date);

    Ok(AcceptedMail {
        mode: mail.mode,
        crm_user,
        contact_email: contact_email.to_lowercase(),
        subject: mail.subject,
        body,
        forward_comment: mail.forward_comment,
        date: mail.date,
        received_at,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
