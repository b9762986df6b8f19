//! Template editor pane: one row per field with its type and flags.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, Row, Table, TableState},
};
use sgc_core::field::FieldType;

use crate::app::{App, EditorMode};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(state) = app.editor.as_ref() else {
    return;
  };
  let title = match state.mode {
    EditorMode::Create => format!(" New template: {} ", app.editor_name()),
    EditorMode::Edit(_) => format!(" Editing {} ", app.editor_name()),
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(super::border_style(true));

  let rows = app.editor_fields().iter().enumerate().map(|(i, field)| {
    let name = if field.name.is_empty() {
      format!("(field {})", i + 1)
    } else {
      field.name.clone()
    };
    let flag = |on: bool| if on { "yes" } else { "" };
    let (options, default, total) = match field.field_type {
      FieldType::Choice => (field.options_text(), String::new(), ""),
      FieldType::Number => (
        String::new(),
        field.default_number().to_string(),
        flag(field.include_in_total),
      ),
      _ => (String::new(), String::new(), ""),
    };
    Row::new(vec![
      name,
      field.field_type.label().to_owned(),
      flag(field.required).to_owned(),
      options,
      default,
      total.to_owned(),
    ])
  });

  let widths = [
    Constraint::Percentage(25),
    Constraint::Length(16),
    Constraint::Length(9),
    Constraint::Fill(1),
    Constraint::Length(9),
    Constraint::Length(6),
  ];
  let header = Row::new(["Name", "Type", "Required", "Options", "Default", "Total"]).style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );

  let mut table_state = TableState::default().with_selected(Some(state.cursor));
  f.render_stateful_widget(
    Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
    area,
    &mut table_state,
  );
}
