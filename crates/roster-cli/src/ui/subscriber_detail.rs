//! Subscriber detail pane: bottom right.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};
use roster_core::record::SubscriberRecord;

use crate::app::{App, Screen};

/// Render the detail pane into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let view = &app.view;
  let title = match &view.detail {
    Some(record) => format!(" {} ", record.display_name()),
    None => " Detail ".to_string(),
  };
  let border = if app.screen == Screen::SubscriberDetail {
    Color::Gray
  } else {
    Color::DarkGray
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = match &view.detail {
    Some(record) => field_lines(record),
    None if app.screen == Screen::SubscriberDetail && view.detail_notice.is_none() => {
      vec![dim("Loading…")]
    }
    None => vec![dim("Select a subscriber and press Enter.")],
  };

  if let Some(notice) = &view.detail_notice {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      notice.clone(),
      Style::default().fg(Color::Red),
    )));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn dim(text: &str) -> Line<'static> {
  Line::from(Span::styled(
    text.to_string(),
    Style::default().fg(Color::DarkGray),
  ))
}

fn field_lines(record: &SubscriberRecord) -> Vec<Line<'static>> {
  let created = match (record.created_at.as_deref(), record.created_date()) {
    (Some(_), Some(date)) => date.format("%Y-%m-%d").to_string(),
    (Some(raw), None) => format!("{raw} (unrecognised)"),
    (None, _) => "-".to_string(),
  };

  [
    ("id", record.id.to_string()),
    ("first name", record.first_name.clone()),
    ("last name", record.last_name.clone()),
    ("email", record.email.clone()),
    ("phone", record.phone.clone().unwrap_or_else(|| "-".into())),
    ("created", created),
  ]
  .into_iter()
  .map(|(label, value)| {
    Line::from(vec![
      Span::styled(
        format!("{label:<12}"),
        Style::default()
          .fg(Color::Cyan)
          .add_modifier(Modifier::BOLD),
      ),
      Span::raw(value),
    ])
  })
  .collect()
}
