//! TUI rendering: orchestrates all panes.

pub mod signups;
pub mod subscriber_detail;
pub mod subscriber_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S>(f: &mut Frame, app: &App<S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let who = match app.session.credential() {
    Ok(cred) if !cred.identity().is_empty() => cred.identity().to_string(),
    Ok(_) => "signed in".to_string(),
    Err(_) => "signed out".to_string(),
  };

  let left = Span::styled(
    " roster  [/] search  [r] refresh  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{who}  {date} "),
    Style::default().fg(Color::Gray),
  );

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  // Left: subscriber list. Right: sign-up chart over the detail pane.
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  subscriber_list::draw(f, cols[0], app);

  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(cols[1]);

  signups::draw(f, right[0], app);
  subscriber_detail::draw(f, right[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = match &app.screen {
    Screen::SubscriberList if app.filter_active => (
      "SEARCH",
      "Type to filter  Esc clear  Enter done",
    ),
    Screen::SubscriberList => (
      "NORMAL",
      "↑↓/jk navigate  / search  Enter detail  r refresh  q quit",
    ),
    Screen::SubscriberDetail => (
      "DETAIL",
      "Esc back  [ prev  ] next  r refresh  q quit",
    ),
  };

  let (status, status_color) = if !app.status_msg.is_empty() {
    (app.status_msg.clone(), Color::Yellow)
  } else if app.view.loading {
    ("Loading subscribers…".to_string(), Color::Cyan)
  } else if let Some(err) = &app.view.error {
    (err.clone(), Color::Red)
  } else {
    (hints.to_string(), Color::DarkGray)
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(status_color),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
