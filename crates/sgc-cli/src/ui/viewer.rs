//! Scrollable read-only text, used for exported and imported JSON.

use ratatui::{
  Frame,
  layout::Rect,
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(viewer) = app.viewer.as_ref() else {
    return;
  };
  let block = Block::default()
    .title(format!(" {} ", viewer.title))
    .borders(Borders::ALL)
    .border_style(super::border_style(true));
  let text = viewer.lines.join("\n");
  let scroll = u16::try_from(viewer.scroll).unwrap_or(u16::MAX);
  f.render_widget(Paragraph::new(text).block(block).scroll((scroll, 0)), area);
}
