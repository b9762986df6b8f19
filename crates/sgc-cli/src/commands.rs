//! Non-interactive subcommands: everything except the terminal UI.

use std::{
  fs,
  io::{self, BufRead, Write},
  path::Path,
};

use anyhow::{Context, Result};
use sgc_core::{
  form::{FieldPrompt, FormAction, FormEngine, FormOutcome, FormSession, InputSurface},
  store::{RecordStore, TemplateStore},
  table::RecordTable,
};
use sgc_store_json::{JsonStore, import_file, to_pretty_string};

/// `sgc list`: one template key per line, sorted.
pub fn list(store: &JsonStore, out: &mut impl Write) -> Result<()> {
  let mut keys = store
    .list_templates()?
    .collect::<Result<Vec<_>, _>>()
    .context("listing templates")?;
  keys.sort();
  if keys.is_empty() {
    writeln!(out, "No templates saved yet.")?;
  }
  for key in keys {
    writeln!(out, "{key}")?;
  }
  Ok(())
}

/// `sgc show`: a template's fields, then its stored records as a
/// tab-separated table followed by the grand total.
pub fn show(store: &JsonStore, key: &str, out: &mut impl Write) -> Result<()> {
  let template = store
    .load_template(key)
    .with_context(|| format!("loading template {key}"))?;
  writeln!(out, "{}", template.name)?;
  for field in &template.fields {
    let mut notes = Vec::new();
    if field.required {
      notes.push("required".to_owned());
    }
    if !field.options.is_empty() {
      notes.push(format!("options: {}", field.options_text()));
    }
    if field.counts_toward_total() {
      notes.push("total".to_owned());
    }
    writeln!(
      out,
      "  {} ({}){}",
      field.name,
      field.field_type.label(),
      if notes.is_empty() {
        String::new()
      } else {
        format!(" [{}]", notes.join("; "))
      }
    )?;
  }

  let records = store
    .load_records(key)
    .with_context(|| format!("loading records of {key}"))?;
  writeln!(out)?;
  if records.is_empty() {
    writeln!(out, "No records yet.")?;
    return Ok(());
  }
  let table = RecordTable::project(&records, template.key_field());
  let header: Vec<&str> = table
    .key_column
    .iter()
    .chain(&table.columns)
    .map(String::as_str)
    .collect();
  writeln!(out, "{}", header.join("\t"))?;
  for row in &table.rows {
    let key = table.key_column.as_ref().map(|_| &row.key);
    let cells: Vec<String> = key
      .into_iter()
      .chain(&row.cells)
      .map(|c| c.as_ref().map(ToString::to_string).unwrap_or_default())
      .collect();
    writeln!(out, "{}", cells.join("\t"))?;
  }
  writeln!(out, "Total: {}", table.grand_total())?;
  Ok(())
}

/// `sgc export`: the stored file, re-serialised, to `output`
/// or `out`.
pub fn export(
  store: &JsonStore,
  key: &str,
  records: bool,
  output: Option<&Path>,
  out: &mut impl Write,
) -> Result<()> {
  let exported = if records {
    store.export_records(key)
  } else {
    store.export_template(key)
  };
  let text = exported.with_context(|| format!("exporting {key}"))?;

  match output {
    Some(path) => {
      fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
      tracing::info!(key, path = %path.display(), "exported");
    }
    None => writeln!(out, "{text}")?,
  }
  Ok(())
}

/// `sgc import`: parse and print a JSON document. Nothing is stored.
pub fn import(path: &Path, out: &mut impl Write) -> Result<()> {
  let value = import_file(path).with_context(|| format!("importing {}", path.display()))?;
  writeln!(out, "{}", to_pretty_string(&value)?)?;
  Ok(())
}

/// `sgc delete`: remove a template; its records stay on disk.
pub fn delete(store: &JsonStore, key: &str, out: &mut impl Write) -> Result<()> {
  store
    .delete_template(key)
    .with_context(|| format!("deleting {key}"))?;
  writeln!(out, "Deleted template {key:?}; its records were kept.")?;
  Ok(())
}

/// `sgc fill`: fill in one record field by field on a line-based terminal.
pub fn fill(store: &JsonStore, key: &str, persist_records: bool) -> Result<()> {
  let template = store
    .load_template(key)
    .with_context(|| format!("loading template {key}"))?;
  let engine = FormEngine::new(store, persist_records);
  let mut session = FormSession::new();
  let stdin = io::stdin();
  let mut surface = LineSurface {
    input:  stdin.lock(),
    output: io::stdout(),
  };

  loop {
    let (report, outcome) = engine.run(&mut session, &template, &mut surface)?;
    for warning in &report.warnings {
      tracing::warn!(%warning, "stale choice");
      writeln!(surface.output, "warning: {warning}")?;
    }
    for rejected in &report.rejected {
      writeln!(surface.output, "rejected: {rejected}")?;
    }
    match outcome {
      FormOutcome::Submitted(record) => {
        writeln!(surface.output, "Saved: {}", serde_json::to_string(&record)?)?;
        return Ok(());
      }
      FormOutcome::Cleared => writeln!(surface.output, "Fields cleared.")?,
      FormOutcome::Edited if report.rejected.is_empty() => {
        writeln!(surface.output, "Nothing saved.")?;
        return Ok(());
      }
      FormOutcome::Edited => {}
    }
  }
}

/// An [`InputSurface`] that prompts on one stream and reads answers from
/// another. An empty answer keeps the current value.
struct LineSurface<R, W> {
  input:  R,
  output: W,
}

impl<R: BufRead, W: Write> LineSurface<R, W> {
  fn ask(&mut self, question: &str) -> Option<String> {
    write!(self.output, "{question}").ok()?;
    self.output.flush().ok()?;
    let mut line = String::new();
    match self.input.read_line(&mut line) {
      Ok(0) | Err(_) => None,
      Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_owned()),
    }
  }
}

impl<R: BufRead, W: Write> InputSurface for LineSurface<R, W> {
  fn field_input(&mut self, prompt: &FieldPrompt<'_>) -> Option<String> {
    let current = prompt.current.map(ToString::to_string).unwrap_or_default();
    let marker = if prompt.required { "*" } else { "" };
    let choices = if prompt.options.is_empty() {
      String::new()
    } else {
      format!(" {{{}}}", prompt.options.join("|"))
    };
    let answer = self.ask(&format!(
      "{}{marker} ({}){choices} [{current}]: ",
      prompt.label,
      prompt.field_type.label()
    ))?;
    (!answer.is_empty()).then_some(answer)
  }

  fn button_pressed(&mut self, action: FormAction) -> bool {
    let question = match action {
      FormAction::Submit => "Save record? [y/N] ",
      FormAction::ClearFields => "Clear fields and start over? [y/N] ",
    };
    self
      .ask(question)
      .is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("s"))
  }
}

#[cfg(test)]
mod tests {
  use sgc_core::{
    field::{FieldDefinition, FieldType},
    record::Record,
    template::Template,
    value::FieldValue,
  };

  use super::*;

  fn store() -> (tempfile::TempDir, JsonStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path(), "registros").unwrap();
    (dir, store)
  }

  #[test]
  fn list_is_sorted() {
    let (_dir, s) = store();
    for name in ["b", "a"] {
      s.store_template(&Template::new(name, vec![FieldDefinition::totalled("n")]))
        .unwrap();
    }
    let mut out = Vec::new();
    list(&s, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");
  }

  #[test]
  fn show_prints_fields_and_records() {
    let (_dir, s) = store();
    let template = Template::new("Gastos", vec![
      FieldDefinition::new("Concepto", FieldType::Text),
      FieldDefinition::totalled("Monto"),
    ]);
    s.store_template(&template).unwrap();
    for (concepto, monto) in [("pan", 2.0), ("leche", 3.5)] {
      let record: Record = [
        ("Concepto", FieldValue::Text(concepto.into())),
        ("Monto", FieldValue::Number(monto)),
      ]
      .into_iter()
      .collect();
      s.append_record("Gastos", &record).unwrap();
    }

    let mut out = Vec::new();
    show(&s, "Gastos", &mut out).unwrap();
    let shown = String::from_utf8(out).unwrap();
    assert!(shown.contains("  Monto (Número) [total]\n"));
    assert!(shown.contains("Concepto\tMonto\npan\t2\nleche\t3.5\n"));
    assert!(shown.ends_with("Total: 5.5\n"));
  }

  #[test]
  fn line_surface_drives_a_submission() {
    let (_dir, s) = store();
    let template = Template::new("Gastos", vec![FieldDefinition::totalled("Monto")]);
    let engine = FormEngine::new(&s, true);
    let mut session = FormSession::new();
    let mut surface = LineSurface {
      input:  &b"12.5\ny\n"[..],
      output: Vec::new(),
    };

    let (_, outcome) = engine.run(&mut session, &template, &mut surface).unwrap();
    assert!(matches!(outcome, FormOutcome::Submitted(_)));
    assert_eq!(s.load_records("Gastos").unwrap().len(), 1);
    let shown = String::from_utf8(surface.output).unwrap();
    assert!(shown.starts_with("Monto (Número) [0]: "));
  }

  #[test]
  fn empty_answer_keeps_value_and_declines() {
    let (_dir, s) = store();
    let template = Template::new("Gastos", vec![FieldDefinition::totalled("Monto")]);
    let engine = FormEngine::new(&s, true);
    let mut session = FormSession::new();
    let mut surface = LineSurface {
      input:  &b"\n\n\n"[..],
      output: Vec::new(),
    };
    let (_, outcome) = engine.run(&mut session, &template, &mut surface).unwrap();
    assert!(matches!(outcome, FormOutcome::Edited));
    assert!(s.load_records("Gastos").unwrap().is_empty());
  }
}
