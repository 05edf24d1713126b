//! Inbound mail classification: BCC vs manual forward.

use tracing::debug;

use crate::error::ParseError;
use crate::model::address::ParsedAddress;
use crate::model::parsed::{Mode, ParsedMail};
use crate::model::payload::InboundEmailPayload;
use crate::parser::forwarded::extract_forwarded_messages;

/// Classify one inbound email.
///
/// A non-blank `Bcc` means the CRM user BCC'd the inbound mailbox; anything
/// else is treated as a manual forward. The only error is a forward in
/// which no forwarded block can be found.
pub fn classify(payload: &InboundEmailPayload) -> Result<ParsedMail, ParseError> {
    if payload.is_bcc() {
        Ok(classify_bcc(payload))
    } else {
        classify_forwarded(payload)
    }
}

fn classify_bcc(payload: &InboundEmailPayload) -> ParsedMail {
    let contact_email = payload
        .to_full
        .as_ref()
        .and_then(|list| list.first())
        .map(|r| r.email.clone())
        .or_else(|| payload.to.as_deref().and_then(ParsedAddress::first_email));

    debug!(
        contact = contact_email.as_deref().unwrap_or(""),
        "Classified as BCC"
    );

    ParsedMail {
        mode: Mode::Bcc,
        crm_user: crm_user(payload),
        contact_email,
        date: payload.date.clone(),
        subject: payload.subject.clone(),
        body: Some(payload.effective_body().to_string()),
        forward_comment: None,
    }
}

fn classify_forwarded(payload: &InboundEmailPayload) -> Result<ParsedMail, ParseError> {
    let mut messages = extract_forwarded_messages(payload.effective_body());
    if messages.is_empty() {
        debug!("Forwarded mode but no forwarded block found");
        return Err(ParseError::NoForwardedMessages);
    }
    if messages.len() > 1 {
        debug!(
            blocks = messages.len(),
            "Several forwarded blocks, using the first"
        );
    }
    let first = messages.swap_remove(0);

    let contact_email = first.headers.from_address().and_then(|a| a.email);
    debug!(
        contact = contact_email.as_deref().unwrap_or(""),
        "Classified as FORWARDED"
    );

    Ok(ParsedMail {
        mode: Mode::Forwarded,
        crm_user: crm_user(payload),
        contact_email,
        date: payload.date.clone(),
        subject: payload.subject.clone(),
        body: Some(first.body),
        forward_comment: payload.stripped_text_reply.as_deref().map(forward_comment),
    })
}

/// The CRM user who sent or forwarded the message.
fn crm_user(payload: &InboundEmailPayload) -> Option<String> {
    let full = payload.from_full.email.trim();
    if !full.is_empty() {
        return Some(full.to_string());
    }
    payload.from.as_deref().and_then(ParsedAddress::first_email)
}

/// The comment a user typed above the forward marker.
///
/// `StrippedTextReply` ends with the marker line itself, so the last line
/// is dropped.
pub fn forward_comment(stripped_text_reply: &str) -> String {
    let mut lines: Vec<&str> = stripped_text_reply.split('\n').collect();
    lines.pop();
    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payload::Recipient;

    fn payload(from: &str) -> InboundEmailPayload {
        InboundEmailPayload {
            from: Some(from.to_string()),
            from_full: Recipient {
                email: from.to_string(),
                name: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_bcc_scenario() {
        let mut p = payload("trygve@kodemaker.no");
        p.bcc = Some("4bd2e0f4b0b04c0a9d3b@inbound.postmarkapp.com".into());
        p.to = Some("\"Kunde Knutsen\" <kunde.knutsen@firma.com>".into());
        p.text_body = Some("Tekst, her\ner\ndet mye\nsnadder\n".into());

        let mail = classify(&p).unwrap();
        assert_eq!(mail.mode, Mode::Bcc);
        assert_eq!(mail.crm_user.as_deref(), Some("trygve@kodemaker.no"));
        assert_eq!(mail.contact_email.as_deref(), Some("kunde.knutsen@firma.com"));
        assert_eq!(mail.body.as_deref(), Some("Tekst, her\ner\ndet mye\nsnadder\n"));
        assert_eq!(mail.forward_comment, None);
    }

    #[test]
    fn test_bcc_prefers_to_full() {
        let mut p = payload("trygve@kodemaker.no");
        p.bcc = Some("x@inbound.postmarkapp.com".into());
        p.to = Some("other@firma.com".into());
        p.to_full = Some(vec![Recipient {
            email: "kunde@firma.com".into(),
            name: Some("Kunde".into()),
        }]);
        p.stripped_text_reply = Some("ignored\n---".into());

        let mail = classify(&p).unwrap();
        assert_eq!(mail.contact_email.as_deref(), Some("kunde@firma.com"));
        assert_eq!(mail.forward_comment, None);
        assert_eq!(mail.body.as_deref(), Some(""));
    }

    #[test]
    fn test_crm_user_falls_back_to_from_header() {
        let mut p = payload("");
        p.from = Some("Trygve <trygve@kodemaker.no>".into());
        p.bcc = Some("x@inbound.postmarkapp.com".into());
        assert_eq!(
            classify(&p).unwrap().crm_user.as_deref(),
            Some("trygve@kodemaker.no")
        );
    }

    #[test]
    fn test_forwarded_without_block_is_error() {
        let mut p = payload("trygve@kodemaker.no");
        p.text_body = Some("Hei, bare en vanlig melding.\n".into());
        assert_eq!(classify(&p), Err(ParseError::NoForwardedMessages));
    }

    #[test]
    fn test_blank_line_after_marker_is_error() {
        let mut p = payload("trygve@kodemaker.no");
        p.text_body = Some(
            "---------- Forwarded message ---------\n\n\
From: Kunde <kunde@firma.com>\n\
Subject: Hei\n\
\n\
Innhold\n"
                .into(),
        );
        assert_eq!(classify(&p), Err(ParseError::NoForwardedMessages));
    }

    #[test]
    fn test_forwarded_uses_outer_date_and_subject() {
        let mut p = payload("trygve@kodemaker.no");
        p.date = Some("Mon, 11 Mar 2024 08:00:00 +0100".into());
        p.subject = Some("Fwd: Viktig".into());
        p.text_body = Some(
            "---------- Forwarded message ---------\n\
From: Kunde <kunde@firma.com>\n\
Date: Fri, 8 Mar 2024 at 09:12\n\
Subject: Viktig\n\
\n\
Hei\n"
                .into(),
        );

        let mail = classify(&p).unwrap();
        assert_eq!(mail.mode, Mode::Forwarded);
        assert_eq!(mail.date.as_deref(), Some("Mon, 11 Mar 2024 08:00:00 +0100"));
        assert_eq!(mail.subject.as_deref(), Some("Fwd: Viktig"));
        assert_eq!(mail.contact_email.as_deref(), Some("kunde@firma.com"));
        assert_eq!(mail.body.as_deref(), Some("Hei"));
        assert_eq!(mail.forward_comment, None);
    }

    #[test]
    fn test_forwarded_html_fallback_is_raw() {
        let mut p = payload("trygve@kodemaker.no");
        p.html_body = Some("<div>---------- Forwarded message ---------<br>From: a@b.no</div>".into());
        assert_eq!(classify(&p), Err(ParseError::NoForwardedMessages));
    }

    #[test]
    fn test_forward_comment_drops_marker_line() {
        assert_eq!(
            forward_comment("line1\nline2\n---------- Forwarded message ---------"),
            "line1\nline2"
        );
        assert_eq!(
            forward_comment("(Body lagt på ved forwarding)\n\n---------- Forwarded message ---------"),
            "(Body lagt på ved forwarding)"
        );
        assert_eq!(forward_comment("---------- Forwarded message ---------"), "");
    }
}
