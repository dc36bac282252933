//! Error type for `roster-http`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("invalid base url {0:?}")]
  BaseUrl(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
