//! Template list pane: left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Screen};

/// Render the template list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_templates();
  let total = app.templates.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Templates ({}/{total}) ", filtered.len())
  } else {
    format!(" Templates ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(super::border_style(app.screen == Screen::Templates));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if app.filter_active || !app.filter.is_empty() && inner.height > 2 {
    let filter_area = Rect {
      y: inner.y + inner.height.saturating_sub(1),
      height: 1,
      ..inner
    };
    inner.height = inner.height.saturating_sub(1);

    let cursor = if app.filter_active { "_" } else { "" };
    f.render_widget(
      Paragraph::new(format!("/{}{cursor}", app.filter)).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let items: Vec<ListItem> = filtered.iter().map(|key| ListItem::new(*key)).collect();

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
