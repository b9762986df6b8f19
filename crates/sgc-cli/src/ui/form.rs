//! Form pane: one line per field of the open template, then the running
//! total and any missing required fields.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use sgc_core::{
  field::FieldType,
  form::{compute_total, missing_required},
  template::Template,
};

use crate::app::{App, Screen};

pub fn draw(f: &mut Frame, area: Rect, app: &App, template: &Template) {
  let focused = app.screen == Screen::Form;
  let block = Block::default()
    .title(format!(" {} ", template.name))
    .borders(Borders::ALL)
    .border_style(super::border_style(focused));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let values = app.session.values(&template.name);
  let label_width = template
    .fields
    .iter()
    .map(|field| field.name.chars().count())
    .max()
    .unwrap_or(0)
    + 2;

  let mut lines: Vec<Line> = template
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let marker = if field.required { "*" } else { " " };
      let value = values
        .get(&field.name)
        .map(ToString::to_string)
        .unwrap_or_default();
      let value = if field.field_type == FieldType::Choice {
        format!("< {value} >")
      } else {
        value
      };

      let cursor = focused && i == app.form_cursor;
      let value_style = if cursor {
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };

      Line::from(vec![
        Span::styled(
          format!("{marker}{:<label_width$}", field.name),
          Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, value_style),
        Span::styled(
          format!("  {}", field.field_type.label()),
          Style::default().fg(Color::DarkGray),
        ),
      ])
    })
    .collect();

  lines.push(Line::from(""));
  let mut summary = vec![Span::styled(
    format!("Total: {}", compute_total(template, values)),
    Style::default().add_modifier(Modifier::BOLD),
  )];
  let missing = missing_required(template, values);
  if !missing.is_empty() {
    summary.push(Span::styled(
      format!("   missing: {}", missing.join(", ")),
      Style::default().fg(Color::Yellow),
    ));
  }
  lines.push(Line::from(summary));

  f.render_widget(Paragraph::new(lines), inner);
}
