//! [`Directory`]: the synchronised subscriber view.
//!
//! Owns the record store, the search query, the derived filtered view and
//! monthly histogram, and the detail selection. Every mutation happens under
//! one lock, so a [`Snapshot`] never mixes derived state from two different
//! record sets.
//!
//! Network calls are the only suspension points. Each slot (list refresh,
//! detail fetch) hands out a monotonically increasing ticket when a request
//! starts; a response is applied only if its ticket is still the latest one.

use std::{
  future::Future,
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use tracing::{debug, info, warn};

use crate::{
  aggregate::{MonthBucket, aggregate},
  error::{Error, FetchError, Result},
  filter::derive_filtered_view,
  record::{SubscriberId, SubscriberRecord},
  session::Session,
  source::SubscriberSource,
};

/// Upper bound on any single fetch issued by the directory.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What happened to the response of a request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The response was the latest for its slot and is now visible.
  Applied,
  /// A newer request for the same slot started first; the response was
  /// dropped without touching any state.
  Superseded,
}

/// A consistent read of everything the directory publishes.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  pub records:       Arc<Vec<SubscriberRecord>>,
  pub filtered:      Arc<Vec<SubscriberRecord>>,
  pub months:        Arc<Vec<MonthBucket>>,
  pub query:         String,
  pub loading:       bool,
  /// Sync channel: why the last refresh failed.
  pub error:         Option<String>,
  pub detail:        Option<SubscriberRecord>,
  /// Detail channel: why the last detail fetch failed.
  pub detail_notice: Option<String>,
}

#[derive(Debug, Default)]
struct State {
  view:           Snapshot,
  refresh_ticket: u64,
  detail_ticket:  u64,
}

impl State {
  fn replace_records(&mut self, records: Vec<SubscriberRecord>) {
    self.view.months = Arc::new(aggregate(&records));
    self.view.records = Arc::new(records);
    self.rederive_filter();
  }

  fn rederive_filter(&mut self) {
    self.view.filtered =
      Arc::new(derive_filtered_view(&self.view.records, &self.view.query));
  }
}

/// Clears the loading flag if a refresh future is dropped before its response
/// arrives, so an abandoned request cannot leave the directory loading.
struct LoadingGuard<'a> {
  state:  &'a Mutex<State>,
  ticket: u64,
  armed:  bool,
}

impl LoadingGuard<'_> {
  fn disarm(mut self) {
    self.armed = false;
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let mut state = self
      .state
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if state.refresh_ticket == self.ticket {
      state.view.loading = false;
    }
  }
}

pub struct Directory<S> {
  source:  S,
  timeout: Duration,
  state:   Mutex<State>,
}

impl<S: SubscriberSource> Directory<S> {
  pub fn new(source: S) -> Self {
    Self::with_timeout(source, DEFAULT_TIMEOUT)
  }

  pub fn with_timeout(source: S, timeout: Duration) -> Self {
    Self {
      source,
      timeout,
      state: Mutex::new(State::default()),
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    self
      .state
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  async fn bounded<T>(
    &self,
    fetch: impl Future<Output = Result<T, FetchError>>,
  ) -> Result<T, FetchError> {
    tokio::time::timeout(self.timeout, fetch)
      .await
      .unwrap_or(Err(FetchError::TimedOut(self.timeout)))
  }

  // ── Sync ──────────────────────────────────────────────────────────────────

  /// Fetch the full subscriber list and replace the record store.
  ///
  /// Fails with [`Error::Unauthorized`] before any request when `session`
  /// holds no credential; nothing is recorded in that case. On any other
  /// failure the store and its derived views are left as they were and the
  /// error is published on the sync channel.
  pub async fn refresh(&self, session: &Session) -> Result<Outcome> {
    let credential = session.credential()?;

    let ticket = {
      let mut state = self.lock();
      state.refresh_ticket += 1;
      state.view.loading = true;
      state.refresh_ticket
    };
    debug!(ticket, "refreshing subscriber list");
    let guard = LoadingGuard { state: &self.state, ticket, armed: true };

    let fetched = self.bounded(self.source.list_subscribers(credential)).await;
    guard.disarm();

    let mut state = self.lock();
    if state.refresh_ticket != ticket {
      debug!(ticket, latest = state.refresh_ticket, "dropping superseded subscriber list");
      return Ok(Outcome::Superseded);
    }
    state.view.loading = false;

    match fetched {
      Ok(records) => {
        info!(count = records.len(), "subscriber list refreshed");
        state.replace_records(records);
        state.view.error = None;
        Ok(Outcome::Applied)
      }
      Err(e) => {
        let err = Error::Load(e);
        warn!(error = %err, "subscriber refresh failed");
        state.view.error = Some(err.to_string());
        Err(err)
      }
    }
  }

  // ── Search ────────────────────────────────────────────────────────────────

  /// Replace the query and recompute the filtered view from the current
  /// store. Allowed while a refresh is outstanding.
  pub fn set_query(&self, query: impl Into<String>) {
    let mut state = self.lock();
    state.view.query = query.into();
    state.rederive_filter();
  }

  // ── Detail ────────────────────────────────────────────────────────────────

  /// Fetch one subscriber and make it the detail selection.
  ///
  /// On failure the current selection is kept and the error is published on
  /// the detail channel, never on the sync channel.
  pub async fn view_detail(&self, session: &Session, id: &SubscriberId) -> Result<Outcome> {
    let credential = session.credential()?;

    let ticket = {
      let mut state = self.lock();
      state.detail_ticket += 1;
      state.detail_ticket
    };
    debug!(ticket, %id, "fetching subscriber detail");

    let fetched = self
      .bounded(self.source.get_subscriber(credential, id))
      .await
      .and_then(|record| {
        if record.id.same_as(id) {
          Ok(record)
        } else {
          Err(FetchError::Malformed(format!(
            "asked for subscriber {id}, got {}",
            record.id
          )))
        }
      });

    let mut state = self.lock();
    if state.detail_ticket != ticket {
      debug!(ticket, latest = state.detail_ticket, "dropping superseded subscriber detail");
      return Ok(Outcome::Superseded);
    }

    match fetched {
      Ok(record) => {
        state.view.detail = Some(record);
        state.view.detail_notice = None;
        Ok(Outcome::Applied)
      }
      Err(e) => {
        let err = Error::Detail(e);
        warn!(error = %err, "subscriber detail failed");
        state.view.detail_notice = Some(err.to_string());
        Err(err)
      }
    }
  }

  /// Clear the detail selection and its notice. Any detail fetch still in
  /// flight is invalidated.
  pub fn dismiss(&self) {
    let mut state = self.lock();
    state.detail_ticket += 1;
    state.view.detail = None;
    state.view.detail_notice = None;
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> Snapshot {
    self.lock().view.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.lock().view.loading
  }

  pub fn error(&self) -> Option<String> {
    self.lock().view.error.clone()
  }

  pub fn query(&self) -> String {
    self.lock().view.query.clone()
  }

  pub fn records(&self) -> Arc<Vec<SubscriberRecord>> {
    Arc::clone(&self.lock().view.records)
  }

  pub fn filtered(&self) -> Arc<Vec<SubscriberRecord>> {
    Arc::clone(&self.lock().view.filtered)
  }

  pub fn months(&self) -> Arc<Vec<MonthBucket>> {
    Arc::clone(&self.lock().view.months)
  }

  pub fn detail(&self) -> Option<SubscriberRecord> {
    self.lock().view.detail.clone()
  }

  pub fn detail_notice(&self) -> Option<String> {
    self.lock().view.detail_notice.clone()
  }
}
