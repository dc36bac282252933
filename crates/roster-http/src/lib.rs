//! HTTP transport for the Roster subscriber service.
//!
//! [`ApiClient`] implements [`roster_core::source::SubscriberSource`] over
//! `reqwest`, plus the two calls the pipeline itself does not make
//! (adding a subscriber, logging in).

mod client;

pub mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::{Error, Result};
