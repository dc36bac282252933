//! Core types and the client-side pipeline for the Roster subscriber directory.
//!
//! This crate is deliberately free of HTTP dependencies. The remote service is
//! reached through the [`source::SubscriberSource`] trait; `roster-http`
//! provides the real implementation.

pub mod aggregate;
pub mod directory;
pub mod error;
pub mod filter;
pub mod record;
pub mod session;
pub mod source;

pub use error::{Error, FetchError, Result};
