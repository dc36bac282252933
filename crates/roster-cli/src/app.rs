//! Application state machine and event dispatcher.
//!
//! Network work is spawned onto tokio so the UI keeps drawing and accepting
//! search input while a request is outstanding. The [`Directory`] decides
//! which response wins; the app only reads its snapshot once per frame.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use roster_core::{
  Error,
  directory::{Directory, Snapshot},
  record::{SubscriberId, SubscriberRecord},
  session::Session,
  source::SubscriberSource,
};
use tracing::warn;

pub const SIGNED_OUT_HINT: &str = "Not signed in: pass --token, set ROSTER_TOKEN, or run `roster login`.";

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the subscriber list.
  SubscriberList,
  /// Focus on the detail pane.
  SubscriberDetail,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// The synchronised subscriber directory.
  pub directory: Arc<Directory<S>>,

  /// Credential passed to every directory call.
  pub session: Session,

  /// Directory state as of the start of the current frame.
  pub view: Snapshot,

  /// Whether the user is typing a search query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* list.
  pub list_cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl<S: SubscriberSource + 'static> App<S> {
  pub fn new(directory: Arc<Directory<S>>, session: Session) -> Self {
    let view = directory.snapshot();
    Self {
      screen: Screen::SubscriberList,
      directory,
      session,
      view,
      filter_active: false,
      list_cursor: 0,
      status_msg: String::new(),
    }
  }

  /// Re-read the directory snapshot and keep the cursor inside the list.
  pub fn sync(&mut self) {
    self.view = self.directory.snapshot();
    let len = self.view.filtered.len();
    if self.list_cursor >= len {
      self.list_cursor = len.saturating_sub(1);
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Start a full refresh in the background.
  pub fn spawn_refresh(&mut self) {
    if !self.session.is_signed_in() {
      self.status_msg = SIGNED_OUT_HINT.into();
      return;
    }
    self.status_msg.clear();
    let directory = Arc::clone(&self.directory);
    let session = self.session.clone();
    tokio::spawn(async move {
      match directory.refresh(&session).await {
        Ok(_) | Err(Error::Load(_)) => {}
        Err(e) => warn!(error = %e, "background refresh failed"),
      }
    });
  }

  /// Switch to the detail pane and fetch `id` in the background.
  fn open_detail(&mut self, id: SubscriberId) {
    if !self.session.is_signed_in() {
      self.status_msg = SIGNED_OUT_HINT.into();
      return;
    }
    self.status_msg.clear();
    self.screen = Screen::SubscriberDetail;
    let directory = Arc::clone(&self.directory);
    let session = self.session.clone();
    tokio::spawn(async move {
      match directory.view_detail(&session, &id).await {
        Ok(_) | Err(Error::Detail(_)) => {}
        Err(e) => warn!(error = %e, %id, "detail fetch failed"),
      }
    });
  }

  fn close_detail(&mut self) {
    self.directory.dismiss();
    self.screen = Screen::SubscriberList;
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// The subscriber under the list cursor, if any.
  pub fn cursor_subscriber(&self) -> Option<&SubscriberRecord> {
    self.view.filtered.get(self.list_cursor)
  }

  fn set_query(&mut self, query: String) {
    self.directory.set_query(query);
    self.list_cursor = 0;
    self.sync();
  }

  fn move_cursor(&mut self, down: bool) -> bool {
    let len = self.view.filtered.len();
    if down && self.list_cursor + 1 < len {
      self.list_cursor += 1;
      true
    } else if !down && self.list_cursor > 0 {
      self.list_cursor -= 1;
      true
    } else {
      false
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return true;
    }

    match self.screen {
      Screen::SubscriberList => self.handle_list_key(key),
      Screen::SubscriberDetail => self.handle_detail_key(key),
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    let mut query = self.view.query.clone();
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.set_query(String::new());
      }
      KeyCode::Enter => {
        self.filter_active = false;
        // Open straight away when the search narrowed to one subscriber.
        if let [only] = self.view.filtered.as_slice() {
          let id = only.id.clone();
          self.open_detail(id);
        }
      }
      KeyCode::Backspace => {
        query.pop();
        self.set_query(query);
      }
      KeyCode::Char(c) => {
        query.push(c);
        self.set_query(query);
      }
      _ => {}
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        self.move_cursor(true);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.move_cursor(false);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_subscriber().map(|s| s.id.clone()) {
          self.open_detail(id);
        }
      }

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.set_query(String::new());
      }

      KeyCode::Char('r') => self.spawn_refresh(),

      _ => {}
    }
    true
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.close_detail(),

      // Step through the list without leaving the detail pane.
      KeyCode::Char(']') | KeyCode::PageDown | KeyCode::Char('j') | KeyCode::Down => {
        if self.move_cursor(true)
          && let Some(id) = self.cursor_subscriber().map(|s| s.id.clone())
        {
          self.open_detail(id);
        }
      }
      KeyCode::Char('[') | KeyCode::PageUp | KeyCode::Char('k') | KeyCode::Up => {
        if self.move_cursor(false)
          && let Some(id) = self.cursor_subscriber().map(|s| s.id.clone())
        {
          self.open_detail(id);
        }
      }

      KeyCode::Char('r') => self.spawn_refresh(),

      _ => {}
    }
    true
  }
}
