//! Core data model: webhook payload, addresses, and classifier output.

pub mod address;
pub mod parsed;
pub mod payload;
