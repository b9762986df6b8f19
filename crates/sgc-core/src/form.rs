//! The form engine: seeding defaults, capturing and coercing raw input,
//! totals, and turning live values into stored records.
//!
//! All per-session state lives in an explicit [`FormSession`] that callers
//! own and pass in. The engine itself only holds the record store and the
//! persistence switch.

use std::collections::{BTreeMap, HashMap};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::{
  Error, Result, StaleChoiceWarning,
  field::{FieldDefinition, FieldType},
  record::Record,
  store::RecordStore,
  template::{Template, TemplateDraft},
  value::{DATE_FORMAT, FieldValue, TIME_FORMAT},
};

/// Live values of one template's form, keyed by field name.
pub type FieldValues = BTreeMap<String, FieldValue>;

static NO_VALUES: FieldValues = BTreeMap::new();

// ─── Session ─────────────────────────────────────────────────────────────────

/// State owned by one interactive session: live field values per template,
/// the template draft being authored, and the records seen so far per
/// template.
#[derive(Debug, Default)]
pub struct FormSession {
  values:    HashMap<String, FieldValues>,
  pub draft: TemplateDraft,
  records:   HashMap<String, Vec<Record>>,
}

impl FormSession {
  pub fn new() -> Self { Self::default() }

  /// Live values of `template_key`'s form; empty if nothing was entered yet.
  pub fn values(&self, template_key: &str) -> &FieldValues {
    self.values.get(template_key).unwrap_or(&NO_VALUES)
  }

  pub fn value(&self, template_key: &str, field: &str) -> Option<&FieldValue> {
    self.values(template_key).get(field)
  }

  fn values_mut(&mut self, template_key: &str) -> &mut FieldValues {
    self.values.entry(template_key.to_owned()).or_default()
  }

  /// Seed a default for every field that has no live value yet, or whose
  /// live value no longer matches the field's type. Fields that already hold
  /// a value of the right type are left alone, so in-progress edits survive
  /// repeated calls.
  pub fn initialize_defaults(&mut self, template: &Template) {
    self.initialize_defaults_at(template, Local::now().naive_local());
  }

  /// [`initialize_defaults`](Self::initialize_defaults) with an explicit
  /// "now" for the date and time defaults.
  pub fn initialize_defaults_at(&mut self, template: &Template, now: NaiveDateTime) {
    let values = self.values_mut(&template.name);
    for field in &template.fields {
      let fits = values
        .get(&field.name)
        .is_some_and(|v| v.field_type() == field.field_type);
      if !fits {
        values.insert(field.name.clone(), default_value(field, now));
      }
    }
  }

  /// Coerce `raw` for the field at `index` and make it the live value.
  ///
  /// A choice outside the field's options falls back to the first option and
  /// returns a warning. Unparseable numbers, dates and times are rejected and
  /// leave the previous value in place.
  pub fn capture(
    &mut self,
    template: &Template,
    index: usize,
    raw: &str,
  ) -> Result<Option<StaleChoiceWarning>> {
    let field = template.fields.get(index).ok_or(Error::FieldIndexOutOfRange {
      index,
      len: template.fields.len(),
    })?;
    let (value, warning) = coerce(field, raw)?;
    self.values_mut(&template.name).insert(field.name.clone(), value);
    Ok(warning)
  }

  /// Replace live choice values that are no longer valid options.
  pub fn reconcile_choices(&mut self, template: &Template) -> Vec<StaleChoiceWarning> {
    let values = self.values_mut(&template.name);
    let mut warnings = Vec::new();
    for field in &template.fields {
      if field.field_type != FieldType::Choice {
        continue;
      }
      let stale = match values.get(&field.name) {
        Some(FieldValue::Choice(current)) if !field.options.contains(current) => {
          current.clone()
        }
        _ => continue,
      };
      let (value, warning) = choose(field, &stale);
      warnings.extend(warning);
      values.insert(field.name.clone(), value);
    }
    warnings
  }

  /// Forget the live values of `template`'s form, so the next
  /// [`initialize_defaults`](Self::initialize_defaults) starts a blank form.
  pub fn clear_fields(&mut self, template: &Template) {
    if let Some(values) = self.values.get_mut(&template.name) {
      for field in &template.fields {
        values.remove(&field.name);
      }
    }
  }

  /// Records cached for `template_key`, if they were loaded or submitted in
  /// this session.
  pub fn cached_records(&self, template_key: &str) -> Option<&[Record]> {
    self.records.get(template_key).map(Vec::as_slice)
  }

  /// Drop the cached records of `template_key` so they are read again.
  pub fn invalidate_records(&mut self, template_key: &str) {
    self.records.remove(template_key);
  }
}

// ─── Coercion ────────────────────────────────────────────────────────────────

/// The value a field starts with.
pub fn default_value(field: &FieldDefinition, now: NaiveDateTime) -> FieldValue {
  match field.field_type {
    FieldType::Text => FieldValue::Text(String::new()),
    FieldType::Number => FieldValue::Number(field.default_number()),
    FieldType::Date => FieldValue::Date(now.date()),
    FieldType::Time => {
      let t = now.time();
      FieldValue::Time(
        NaiveTime::from_hms_opt(t.hour(), t.minute(), t.second()).unwrap_or(t),
      )
    }
    FieldType::Choice => {
      FieldValue::Choice(field.options.first().cloned().unwrap_or_default())
    }
  }
}

/// Turn raw input into a value of `field`'s type.
pub fn coerce(
  field: &FieldDefinition,
  raw: &str,
) -> Result<(FieldValue, Option<StaleChoiceWarning>)> {
  let invalid = |reason| Error::InvalidValue {
    field: field.name.clone(),
    raw: raw.to_owned(),
    reason,
  };
  let value = match field.field_type {
    FieldType::Text => FieldValue::Text(raw.to_owned()),
    FieldType::Number => {
      let n: f64 = raw.trim().parse().map_err(|_| invalid("expected a number"))?;
      if !n.is_finite() {
        return Err(invalid("expected a finite number"));
      }
      FieldValue::Number(n)
    }
    FieldType::Date => FieldValue::Date(
      NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| invalid("expected a date as YYYY-MM-DD"))?,
    ),
    FieldType::Time => {
      let raw = raw.trim();
      FieldValue::Time(
        NaiveTime::parse_from_str(raw, TIME_FORMAT)
          .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
          .map_err(|_| invalid("expected a time as HH:MM or HH:MM:SS"))?,
      )
    }
    FieldType::Choice => return Ok(choose(field, raw)),
  };
  Ok((value, None))
}

fn choose(field: &FieldDefinition, raw: &str) -> (FieldValue, Option<StaleChoiceWarning>) {
  if field.options.iter().any(|o| o == raw) {
    return (FieldValue::Choice(raw.to_owned()), None);
  }
  let fallback = field.options.first().cloned().unwrap_or_default();
  let warning = StaleChoiceWarning {
    field:    field.name.clone(),
    stale:    raw.to_owned(),
    fallback: fallback.clone(),
  };
  (FieldValue::Choice(fallback), Some(warning))
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Sum of the numeric values of fields flagged for inclusion in the total.
/// Missing or non-numeric values are skipped; with no flagged field the
/// total is zero.
pub fn compute_total(template: &Template, values: &FieldValues) -> f64 {
  template
    .fields
    .iter()
    .filter(|f| f.counts_toward_total())
    .filter_map(|f| values.get(&f.name)?.as_number())
    .sum()
}

/// Names of required fields that are missing or blank. Advisory only;
/// submission never checks it.
pub fn missing_required<'t>(template: &'t Template, values: &FieldValues) -> Vec<&'t str> {
  template
    .fields
    .iter()
    .filter(|f| f.required)
    .filter(|f| values.get(&f.name).is_none_or(FieldValue::is_blank))
    .map(|f| f.name.as_str())
    .collect()
}

// ─── Input surface ───────────────────────────────────────────────────────────

/// What an input surface is asked to show for one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldPrompt<'a> {
  pub label:      &'a str,
  pub field_type: FieldType,
  pub current:    Option<&'a FieldValue>,
  pub required:   bool,
  /// Allowed values; only non-empty for choice fields.
  pub options:    &'a [String],
}

/// Buttons a form exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
  Submit,
  ClearFields,
}

/// Whatever draws the widgets and reports what the user did. Any toolkit
/// that can show the five input kinds and report button presses will do.
pub trait InputSurface {
  /// Show `prompt` and return the raw input, or `None` to keep the current
  /// value.
  fn field_input(&mut self, prompt: &FieldPrompt<'_>) -> Option<String>;

  /// Whether `action`'s button was pressed in this interaction.
  fn button_pressed(&mut self, action: FormAction) -> bool;
}

/// Non-fatal findings of one capture pass.
#[derive(Debug, Default)]
pub struct CaptureReport {
  pub warnings: Vec<StaleChoiceWarning>,
  /// Inputs that could not be coerced; those fields kept their value.
  pub rejected: Vec<Error>,
}

/// What one interaction cycle ended with.
#[derive(Debug)]
pub enum FormOutcome {
  Edited,
  Submitted(Record),
  Cleared,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Drives forms against a record store. With `persist_records` off, records
/// only live in the session's cache and the store is never touched.
pub struct FormEngine<'a, R> {
  records:         &'a R,
  persist_records: bool,
}

impl<'a, R: RecordStore> FormEngine<'a, R> {
  pub fn new(records: &'a R, persist_records: bool) -> Self {
    Self {
      records,
      persist_records,
    }
  }

  pub fn persists_records(&self) -> bool { self.persist_records }

  /// Offer every field of `template`, in order, to `surface` and capture
  /// what it returns.
  pub fn render_and_capture(
    &self,
    session: &mut FormSession,
    template: &Template,
    surface: &mut impl InputSurface,
  ) -> CaptureReport {
    let mut report = CaptureReport {
      warnings: session.reconcile_choices(template),
      ..CaptureReport::default()
    };
    for (index, field) in template.fields.iter().enumerate() {
      let prompt = FieldPrompt {
        label:      &field.name,
        field_type: field.field_type,
        current:    session.value(&template.name, &field.name),
        required:   field.required,
        options:    &field.options,
      };
      let Some(raw) = surface.field_input(&prompt) else {
        continue;
      };
      match session.capture(template, index, &raw) {
        Ok(warning) => report.warnings.extend(warning),
        Err(e) => report.rejected.push(e),
      }
    }
    report
  }

  /// Records of `template_key` seen by this session, loading them from the
  /// store on first use when persistence is on.
  pub fn records<'s>(
    &self,
    session: &'s mut FormSession,
    template_key: &str,
  ) -> Result<&'s [Record], R::Error> {
    if !session.records.contains_key(template_key) {
      let loaded = if self.persist_records {
        self.records.load_records(template_key)?
      } else {
        Vec::new()
      };
      session.records.insert(template_key.to_owned(), loaded);
    }
    Ok(
      session
        .records
        .get(template_key)
        .map(Vec::as_slice)
        .unwrap_or_default(),
    )
  }

  /// Turn the live values into a record, store it, and clear the form.
  ///
  /// Only coercion has happened by now; `required` flags are not checked.
  pub fn submit(
    &self,
    session: &mut FormSession,
    template: &Template,
  ) -> Result<Record, R::Error> {
    let values = session.values(&template.name);
    let record: Record = template
      .fields
      .iter()
      .filter_map(|f| values.get(&f.name).map(|v| (f.name.clone(), v.clone())))
      .collect();

    self.records(session, &template.name)?;
    if self.persist_records {
      self.records.append_record(&template.name, &record)?;
    }
    session
      .records
      .entry(template.name.clone())
      .or_default()
      .push(record.clone());
    session.clear_fields(template);
    Ok(record)
  }

  /// One interaction: seed defaults, capture input, then act on the submit
  /// or clear button. A cycle with rejected input never submits.
  pub fn run(
    &self,
    session: &mut FormSession,
    template: &Template,
    surface: &mut impl InputSurface,
  ) -> Result<(CaptureReport, FormOutcome), R::Error> {
    session.initialize_defaults(template);
    let report = self.render_and_capture(session, template, surface);
    let outcome = if !report.rejected.is_empty() {
      FormOutcome::Edited
    } else if surface.button_pressed(FormAction::Submit) {
      FormOutcome::Submitted(self.submit(session, template)?)
    } else if surface.button_pressed(FormAction::ClearFields) {
      session.clear_fields(template);
      FormOutcome::Cleared
    } else {
      FormOutcome::Edited
    };
    Ok((report, outcome))
  }
}
