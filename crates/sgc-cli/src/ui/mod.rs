//! TUI rendering. `draw` lays out header, body and status bar; each pane
//! lives in its own module.

pub mod editor;
pub mod form;
pub mod records;
pub mod template_list;
pub mod viewer;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let mode = if app.persist_records { "" } else { "  (records not saved)" };

  let left = Span::styled(
    format!(" sgc  {}{mode}", app.store.template_dir().display()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  match app.screen {
    Screen::Editor => return editor::draw(f, area, app),
    Screen::Viewer => return viewer::draw(f, area, app),
    Screen::Templates | Screen::Form => {}
  }

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
    .split(area);
  template_list::draw(f, cols[0], app);

  let Some(template) = app.template.as_ref() else {
    return draw_placeholder(f, cols[1], " Form ", "Select a template and press Enter.");
  };

  // Form on top, stored records below.
  let form_height = (template.fields.len() as u16).saturating_add(4);
  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(form_height), Constraint::Min(3)])
    .split(cols[1]);
  form::draw(f, right[0], app, template);
  records::draw(f, right[1], app, template);
}

pub(crate) fn draw_placeholder(f: &mut Frame, area: Rect, title: &str, text: &str) {
  let block = Block::default()
    .title(title.to_owned())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(text.to_owned()).style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

/// Border style for a pane; highlighted when it has focus.
pub(crate) fn border_style(focused: bool) -> Style {
  if focused {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  }
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  // An open line editor takes over the whole bar.
  if let Some(input) = &app.input {
    let line = Line::from(vec![
      Span::styled(
        format!(" {} ", input.target.label()),
        Style::default()
          .fg(Color::Black)
          .bg(Color::Yellow)
          .add_modifier(Modifier::BOLD),
      ),
      Span::raw(format!(" {}_", input.buffer)),
    ]);
    f.render_widget(Paragraph::new(line), area);
    return;
  }

  let (mode_label, hints) = match app.screen {
    Screen::Templates if app.filter_active => {
      ("SEARCH", "Type to filter  Esc cancel  Enter select")
    }
    Screen::Templates => (
      "TEMPLATES",
      "jk move  Enter open  / search  n new  e edit  v view  x records  i import  D delete  q quit",
    ),
    Screen::Form => (
      "FORM",
      "jk move  Enter edit  hl option  s save record  c clear  Esc back",
    ),
    Screen::Editor => (
      "EDITOR",
      "Enter name  t type  r required  o options  i total  d default  +/-/# fields  s save  Esc cancel",
    ),
    Screen::Viewer => ("VIEW", "jk scroll  Esc back"),
  };

  let status = if app.status_msg.is_empty() {
    hints
  } else {
    app.status_msg.as_str()
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
