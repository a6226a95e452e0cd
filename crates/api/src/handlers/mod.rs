//! HTTP handlers for the mobile scanning protocol.

pub mod auth;
pub mod pickings;
pub mod serials;
