//! The `SubscriberSource` trait.
//!
//! Implemented by transports (e.g. `roster-http`). [`crate::directory`]
//! depends on this abstraction, not on any concrete client.

use std::future::Future;

use crate::{
  error::FetchError,
  record::{SubscriberId, SubscriberRecord},
  session::SessionCredential,
};

/// Read access to the remote subscriber service.
///
/// Implementations must have validated every record before returning it, and
/// must attach `credential` to the request.
pub trait SubscriberSource: Send + Sync {
  /// `GET /subscribers`
  fn list_subscribers<'a>(
    &'a self,
    credential: &'a SessionCredential,
  ) -> impl Future<Output = Result<Vec<SubscriberRecord>, FetchError>> + Send + 'a;

  /// `GET /subscribers/{id}`
  fn get_subscriber<'a>(
    &'a self,
    credential: &'a SessionCredential,
    id: &'a SubscriberId,
  ) -> impl Future<Output = Result<SubscriberRecord, FetchError>> + Send + 'a;
}
