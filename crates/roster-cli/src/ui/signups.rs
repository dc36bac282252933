//! Sign-ups per month: top right.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  widgets::{BarChart, Block, Borders, Paragraph},
};

use crate::app::App;

pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let months = &app.view.months;
  let block = Block::default()
    .title(" Sign-ups per month ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  if months.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("No dated subscribers.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  // Keep the most recent months that fit.
  let fits = (area.width.saturating_sub(2) / 8).max(1) as usize;
  let data: Vec<(&str, u64)> = months
    .iter()
    .skip(months.len().saturating_sub(fits))
    .map(|b| (b.month.as_str(), b.count as u64))
    .collect();

  let chart = BarChart::default()
    .block(block)
    .data(data.as_slice())
    .bar_width(7)
    .bar_gap(1)
    .bar_style(Style::default().fg(Color::Cyan))
    .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
  f.render_widget(chart, area);
}
