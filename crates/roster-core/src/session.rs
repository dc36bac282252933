//! Session credential holder.
//!
//! The credential is issued elsewhere (a login flow, a config file, an
//! environment variable). The pipeline only reads it, and every authenticated
//! operation takes the [`Session`] explicitly.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// An opaque bearer token and the identity it was issued to.
#[derive(Debug, Clone)]
pub struct SessionCredential {
  token:    SecretString,
  identity: String,
}

impl SessionCredential {
  pub fn new(token: impl Into<String>, identity: impl Into<String>) -> Self {
    Self {
      token:    SecretString::new(token.into()),
      identity: identity.into(),
    }
  }

  /// Raw token for the `Authorization: Bearer` header.
  pub fn bearer(&self) -> &str {
    self.token.expose_secret()
  }

  pub fn identity(&self) -> &str {
    &self.identity
  }
}

/// The current credential, or none.
#[derive(Debug, Clone, Default)]
pub struct Session {
  credential: Option<SessionCredential>,
}

impl Session {
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn signed_in(credential: SessionCredential) -> Self {
    Self { credential: Some(credential) }
  }

  pub fn sign_in(&mut self, credential: SessionCredential) {
    self.credential = Some(credential);
  }

  pub fn sign_out(&mut self) {
    self.credential = None;
  }

  pub fn is_signed_in(&self) -> bool {
    self.credential.is_some()
  }

  /// The credential to attach to a request, or [`Error::Unauthorized`].
  pub fn credential(&self) -> Result<&SessionCredential> {
    self.credential.as_ref().ok_or(Error::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anonymous_session_is_unauthorized() {
    let session = Session::anonymous();
    assert!(!session.is_signed_in());
    assert!(matches!(session.credential(), Err(Error::Unauthorized)));
  }

  #[test]
  fn sign_in_and_out() {
    let mut session = Session::anonymous();
    session.sign_in(SessionCredential::new("t0k", "admin"));
    let cred = session.credential().unwrap();
    assert_eq!(cred.bearer(), "t0k");
    assert_eq!(cred.identity(), "admin");

    session.sign_out();
    assert!(matches!(session.credential(), Err(Error::Unauthorized)));
  }

  #[test]
  fn debug_output_redacts_token() {
    let cred = SessionCredential::new("super-secret", "admin");
    let shown = format!("{cred:?}");
    assert!(!shown.contains("super-secret"));
    assert!(shown.contains("admin"));
  }
}
