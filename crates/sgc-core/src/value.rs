//! Field values: the typed payload of one cell of a record.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Serialize, Serializer};

use crate::field::FieldType;

/// Textual form of dates in record files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Textual form of times in record files.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A value held by one field. Live form values are tagged by the owning
/// field's type; values decoded from record files carry no schema and come
/// back as `Number` or `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Text(String),
  Number(f64),
  Date(NaiveDate),
  Time(NaiveTime),
  Choice(String),
}

impl FieldValue {
  /// The field type this value belongs to.
  pub fn field_type(&self) -> FieldType {
    match self {
      Self::Text(_) => FieldType::Text,
      Self::Number(_) => FieldType::Number,
      Self::Date(_) => FieldType::Date,
      Self::Time(_) => FieldType::Time,
      Self::Choice(_) => FieldType::Choice,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  /// Whether the value counts as "not filled in" for required-field hints.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Text(s) | Self::Choice(s) => s.trim().is_empty(),
      _ => false,
    }
  }

  /// Decode one stored JSON cell. `null` yields `None`; arrays and objects
  /// are not valid cells.
  pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>, String> {
    use serde_json::Value;
    match value {
      Value::Null => Ok(None),
      Value::Bool(b) => Ok(Some(Self::Text(b.to_string()))),
      Value::Number(n) => n
        .as_f64()
        .map(|n| Some(Self::Number(n)))
        .ok_or_else(|| format!("number {n} is out of range")),
      Value::String(s) => Ok(Some(Self::Text(s.clone()))),
      Value::Array(_) => Err("expected a scalar cell, found an array".into()),
      Value::Object(_) => Err("expected a scalar cell, found an object".into()),
    }
  }
}

impl fmt::Display for FieldValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) | Self::Choice(s) => f.write_str(s),
      Self::Number(n) => write!(f, "{n}"),
      Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
      Self::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
    }
  }
}

/// Values are written as plain JSON scalars.
impl Serialize for FieldValue {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      Self::Text(s) | Self::Choice(s) => serializer.serialize_str(s),
      Self::Number(n) => serializer.serialize_f64(*n),
      Self::Date(_) | Self::Time(_) => serializer.collect_str(self),
    }
  }
}
