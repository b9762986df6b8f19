//! Field definitions: one typed entry in a template's schema.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

// ─── FieldType ───────────────────────────────────────────────────────────────

/// The five kinds of value a field can hold. The serialised labels are the
/// ones written to template files.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
pub enum FieldType {
  #[default]
  #[serde(rename = "Texto")]
  #[strum(serialize = "Texto")]
  Text,
  #[serde(rename = "Número")]
  #[strum(serialize = "Número")]
  Number,
  #[serde(rename = "Fecha")]
  #[strum(serialize = "Fecha")]
  Date,
  #[serde(rename = "Hora")]
  #[strum(serialize = "Hora")]
  Time,
  #[serde(rename = "Opción múltiple")]
  #[strum(serialize = "Opción múltiple")]
  Choice,
}

impl FieldType {
  /// The label used in template files and shown to the user.
  pub fn label(self) -> &'static str { self.into() }

  /// The next type in declaration order, wrapping around. Used by editors
  /// that cycle through types with a single key.
  pub fn cycle(self) -> Self {
    let mut all = Self::iter().cycle();
    all.find(|t| *t == self);
    all.next().unwrap_or_default()
  }
}

// ─── FieldDefinition ─────────────────────────────────────────────────────────

/// One schema entry of a [`Template`](crate::template::Template).
///
/// `options` only matters for [`FieldType::Choice`]; `default_value` and
/// `include_in_total` only matter for [`FieldType::Number`]. They are kept on
/// every field so that switching a field's type back and forth in an editor
/// does not lose them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
  #[serde(rename = "nombre")]
  pub name:             String,
  #[serde(rename = "tipo")]
  pub field_type:       FieldType,
  #[serde(rename = "obligatorio", default)]
  pub required:         bool,
  /// Stored as one comma-separated string.
  #[serde(rename = "opciones", default, with = "comma_list")]
  pub options:          Vec<String>,
  #[serde(rename = "incluir_total", default)]
  pub include_in_total: bool,
  #[serde(
    rename = "valor_default",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub default_value:    Option<f64>,
}

impl FieldDefinition {
  pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
    Self {
      name: name.into(),
      field_type,
      ..Self::default()
    }
  }

  /// A blank field as produced by template creation: unnamed `Text`.
  pub fn blank() -> Self { Self::default() }

  /// A `Choice` field with options parsed from a comma-separated list.
  pub fn choice(name: impl Into<String>, options: &str) -> Self {
    Self {
      options: split_options(options),
      ..Self::new(name, FieldType::Choice)
    }
  }

  /// A `Number` field that is included in the form total.
  pub fn totalled(name: impl Into<String>) -> Self {
    Self {
      include_in_total: true,
      ..Self::new(name, FieldType::Number)
    }
  }

  /// The starting value of a `Number` field.
  pub fn default_number(&self) -> f64 { self.default_value.unwrap_or(0.0) }

  /// Whether this field contributes to [`compute_total`](crate::form::compute_total).
  pub fn counts_toward_total(&self) -> bool {
    self.field_type == FieldType::Number && self.include_in_total
  }

  /// Replace the options from the raw comma-separated text an editor holds.
  pub fn set_options(&mut self, raw: &str) { self.options = split_options(raw); }

  /// The options as the comma-separated text stored on disk.
  pub fn options_text(&self) -> String { self.options.join(",") }

  /// Field-level rules; uniqueness is checked by the owning template.
  /// `position` is zero-based.
  pub fn validate(&self, position: usize) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::EmptyFieldName { position: position + 1 });
    }
    if self.field_type == FieldType::Choice && self.options.is_empty() {
      return Err(Error::EmptyChoiceOptions(self.name.clone()));
    }
    Ok(())
  }
}

/// Split a comma-separated option list, trimming entries and dropping empty
/// ones.
pub fn split_options(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

mod comma_list {
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(options: &[String], serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&options.join(","))
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(super::split_options).unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn labels_match_stored_names() {
    assert_eq!(FieldType::Text.label(), "Texto");
    assert_eq!(FieldType::Number.label(), "Número");
    assert_eq!(FieldType::Choice.label(), "Opción múltiple");
    assert_eq!(
      serde_json::to_value(FieldType::Time).unwrap(),
      json!("Hora")
    );
  }

  #[test]
  fn cycle_wraps_around() {
    assert_eq!(FieldType::Text.cycle(), FieldType::Number);
    assert_eq!(FieldType::Time.cycle(), FieldType::Choice);
    assert_eq!(FieldType::Choice.cycle(), FieldType::Text);
  }

  #[test]
  fn options_are_split_and_trimmed() {
    assert_eq!(split_options("A, B ,C"), vec!["A", "B", "C"]);
    assert_eq!(split_options(""), Vec::<String>::new());
    assert_eq!(split_options(" , ,"), Vec::<String>::new());
  }

  #[test]
  fn deserializes_minimal_field() {
    let field: FieldDefinition =
      serde_json::from_value(json!({"nombre": "Monto", "tipo": "Número"}))
        .unwrap();
    assert_eq!(field.name, "Monto");
    assert_eq!(field.field_type, FieldType::Number);
    assert!(!field.required);
    assert!(field.options.is_empty());
    assert_eq!(field.default_number(), 0.0);
  }

  #[test]
  fn serializes_options_as_comma_string() {
    let field = FieldDefinition::choice("Estado", "A,B,C");
    let value = serde_json::to_value(&field).unwrap();
    assert_eq!(value["opciones"], json!("A,B,C"));
    assert_eq!(value["tipo"], json!("Opción múltiple"));
    assert!(value.get("valor_default").is_none());
  }

  #[test]
  fn unknown_type_label_is_rejected() {
    let result: Result<FieldDefinition, _> =
      serde_json::from_value(json!({"nombre": "x", "tipo": "Booleano"}));
    assert!(result.is_err());
  }

  #[test]
  fn choice_without_options_fails_validation() {
    let field = FieldDefinition::new("Estado", FieldType::Choice);
    assert!(matches!(
      field.validate(0),
      Err(Error::EmptyChoiceOptions(name)) if name == "Estado"
    ));
  }

  #[test]
  fn whitespace_name_fails_validation() {
    let field = FieldDefinition::new("  ", FieldType::Text);
    assert!(matches!(
      field.validate(2),
      Err(Error::EmptyFieldName { position: 3 })
    ));
  }

  #[test]
  fn only_number_fields_count_toward_total() {
    let mut field = FieldDefinition::totalled("Monto");
    assert!(field.counts_toward_total());
    field.field_type = FieldType::Text;
    assert!(!field.counts_toward_total());
  }
}
