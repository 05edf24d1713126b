//! `crmintake` — inbound email classification for a small CRM.
//!
//! Turns an inbound-email webhook payload into a structured record: which
//! CRM user sent or forwarded it, which customer it concerns, the effective
//! body, and whether it arrived by BCC or by manual forward.

pub mod config;
pub mod error;
pub mod intake;
pub mod model;
pub mod parser;
