//! Stored records of the open template as a table, with the grand total.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, Cell, Row, Table},
};
use sgc_core::{table::RecordTable, template::Template, value::FieldValue};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App, template: &Template) {
  let records = app.session.cached_records(&template.name).unwrap_or_default();

  if records.is_empty() {
    return super::draw_placeholder(f, area, " Records ", "No records yet.");
  }

  let table = RecordTable::project(records, template.key_field());
  let block = Block::default()
    .title(format!(" Records ({}) ", table.rows.len()))
    .title_bottom(Line::from(format!(" Total: {} ", table.grand_total())).right_aligned())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let header: Vec<&str> = table
    .key_column
    .iter()
    .chain(&table.columns)
    .map(String::as_str)
    .collect();
  let widths = vec![Constraint::Fill(1); header.len()];

  // Newest last, so keep the tail in view.
  let visible = usize::from(area.height.saturating_sub(3));
  let skip = table.rows.len().saturating_sub(visible);
  let has_key = table.key_column.is_some();
  let rows = table.rows.iter().skip(skip).map(|row| {
    let key = has_key.then(|| cell(row.key.as_ref()));
    Row::new(key.into_iter().chain(row.cells.iter().map(Option::as_ref).map(cell)))
  });

  f.render_widget(
    Table::new(rows, widths)
      .header(
        Row::new(header).style(
          Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ),
      )
      .block(block),
    area,
  );
}

fn cell(value: Option<&FieldValue>) -> Cell<'static> {
  Cell::from(value.map(ToString::to_string).unwrap_or_default())
}
