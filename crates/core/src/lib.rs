//! Domain core for the stockscan warehouse scanning backend.
//!
//! This crate holds everything the HTTP layer and the database layer agree
//! on: shared types, the error taxonomy, the picking state machine, the
//! mobile session service, and the serial-number reconciliation engine.
//! It talks to persistence only through the narrow traits in [`store`],
//! so the engine can be exercised against an in-memory store in tests.

pub mod error;
pub mod picking;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod types;
