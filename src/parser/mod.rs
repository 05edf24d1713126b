//! Inbound mail parsing: classification, forwarded-block extraction, header
//! normalization, date parsing, and raw-message conversion.

pub mod classify;
pub mod date;
pub mod eml;
pub mod forwarded;
pub mod header;

pub use classify::classify;
pub use forwarded::extract_forwarded_messages;
