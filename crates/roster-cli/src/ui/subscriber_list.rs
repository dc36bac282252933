//! Subscriber list pane: left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Screen};

/// Render the filtered subscriber list into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let view = &app.view;
  let filtered = &view.filtered;
  let total = view.records.len();

  // Title with count.
  let title = if app.filter_active || !view.query.is_empty() {
    format!(" Subscribers ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Subscribers ({}) ", total)
  };

  let border = if app.screen == Screen::SubscriberList {
    Color::Gray
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar along the bottom of the pane.
  if (app.filter_active || !view.query.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", view.query)
    } else {
      format!("/{}", view.query)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if filtered.is_empty() {
    let (msg, color) = match &view.error {
      Some(err) if total == 0 => (err.clone(), Color::Red),
      _ if view.loading => ("Loading…".to_string(), Color::DarkGray),
      _ if total == 0 => ("No subscribers.".to_string(), Color::DarkGray),
      _ => ("No matches.".to_string(), Color::DarkGray),
    };
    f.render_widget(Paragraph::new(msg).style(Style::default().fg(color)), inner_area);
    return;
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|record| {
      ListItem::new(Line::from(vec![
        Span::raw(record.display_name()),
        Span::styled(
          format!("  {}", record.email),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
