//! Records: one filled-in instance of a template.
//!
//! A record is an ordered `field name → value` mapping. It is not tied to a
//! fixed struct: templates can be edited after records were stored, so stored
//! records of one template may have different field sets.

use std::fmt;

use serde::{
  Deserialize, Deserializer, Serialize, Serializer,
  de::{self, MapAccess, Visitor},
  ser::SerializeMap,
};

use crate::value::FieldValue;

/// An ordered mapping from field name to value. Names are unique; inserting
/// an existing name replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
  cells: Vec<(String, FieldValue)>,
}

impl Record {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
    let name = name.into();
    match self.cells.iter_mut().find(|(n, _)| *n == name) {
      Some((_, slot)) => *slot = value,
      None => self.cells.push((name, value)),
    }
  }

  pub fn get(&self, name: &str) -> Option<&FieldValue> {
    self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
  }

  pub fn len(&self) -> usize { self.cells.len() }

  pub fn is_empty(&self) -> bool { self.cells.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
    self.cells.iter().map(|(n, v)| (n.as_str(), v))
  }

  pub fn field_names(&self) -> impl Iterator<Item = &str> {
    self.cells.iter().map(|(n, _)| n.as_str())
  }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Record {
  fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
    let mut record = Self::new();
    for (name, value) in iter {
      record.insert(name, value);
    }
    record
  }
}

impl Serialize for Record {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut map = serializer.serialize_map(Some(self.cells.len()))?;
    for (name, value) in &self.cells {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for Record {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_map(RecordVisitor)
  }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
  type Value = Record;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("an object mapping field names to scalar values")
  }

  fn visit_map<A>(self, mut access: A) -> Result<Record, A::Error>
  where
    A: MapAccess<'de>,
  {
    let mut record = Record::new();
    while let Some((name, raw)) =
      access.next_entry::<String, serde_json::Value>()?
    {
      let value = FieldValue::from_json(&raw)
        .map_err(|e| de::Error::custom(format!("field {name:?}: {e}")))?;
      if let Some(value) = value {
        record.insert(name, value);
      }
    }
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn insert_replaces_in_place() {
    let mut record = Record::new();
    record.insert("a", FieldValue::Number(1.0));
    record.insert("b", FieldValue::Text("x".into()));
    record.insert("a", FieldValue::Number(2.0));
    assert_eq!(record.len(), 2);
    assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(record.get("a"), Some(&FieldValue::Number(2.0)));
  }

  #[test]
  fn decoding_keeps_file_order() {
    let record: Record =
      serde_json::from_str(r#"{"z": 1, "a": "x", "m": null}"#).unwrap();
    assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["z", "a"]);
  }

  #[test]
  fn nested_cells_are_rejected() {
    let result: Result<Record, _> = serde_json::from_value(json!({"a": {}}));
    assert!(result.is_err());
  }

  #[test]
  fn serializes_as_flat_object() {
    let record: Record = [
      ("Monto", FieldValue::Number(10.0)),
      ("Nota", FieldValue::Text("ok".into())),
    ]
    .into_iter()
    .collect();
    assert_eq!(
      serde_json::to_value(&record).unwrap(),
      json!({"Monto": 10.0, "Nota": "ok"})
    );
  }
}
