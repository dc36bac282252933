//! Error types for `roster-core`.

use std::time::Duration;

use thiserror::Error;

use crate::record::SubscriberId;

#[derive(Debug, Error)]
pub enum Error {
  /// No session credential is present; no request was issued.
  #[error("not signed in")]
  Unauthorized,

  #[error("could not load subscribers: {0}")]
  Load(#[source] FetchError),

  #[error("could not load subscriber detail: {0}")]
  Detail(#[source] FetchError),

  #[error("invalid subscriber record: {0}")]
  InvalidRecord(String),

  #[error("invalid subscriber: {0}")]
  InvalidSubscriber(String),
}

/// Why a single request to the subscriber service did not produce a value.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("transport failure: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("request rejected with status {0}")]
  Rejected(u16),

  #[error("subscriber {0} not found")]
  NotFound(SubscriberId),

  #[error("malformed response: {0}")]
  Malformed(String),

  #[error("no response within {0:?}")]
  TimedOut(Duration),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
