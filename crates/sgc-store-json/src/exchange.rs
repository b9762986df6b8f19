//! Import and export of raw JSON documents.
//!
//! Imports are display-only: the document is parsed and shown, never merged
//! into a store. Exports re-serialise a stored file as it is on disk.

use std::{fs, io::Read, path::Path};

use serde_json::Value;
use sgc_core::template::validate_key;

use crate::{
  Error, JsonStore, Result,
  codec::{read_json, to_pretty_bytes},
};

/// Parse an arbitrary JSON document from `reader`. `source` names the input
/// in error messages.
pub fn import_document(reader: impl Read, source: &str) -> Result<Value> {
  serde_json::from_reader(reader).map_err(|e| Error::CorruptData {
    location: source.to_owned(),
    source:   e,
  })
}

/// Parse the JSON document at `path`.
pub fn import_file(path: &Path) -> Result<Value> {
  let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
  let value = import_document(file, &path.display().to_string())?;
  tracing::info!(path = %path.display(), "imported document");
  Ok(value)
}

/// Render `value` the way stored files are written.
pub fn to_pretty_string(value: &Value) -> Result<String> {
  let bytes = to_pretty_bytes(value)?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl JsonStore {
  /// The stored template file of `key`, re-serialised.
  pub fn export_template(&self, key: &str) -> Result<String> {
    validate_key(key)?;
    let value: Value = read_json(&self.template_path(key))?
      .ok_or_else(|| Error::TemplateNotFound(key.to_owned()))?;
    to_pretty_string(&value)
  }

  /// The stored records file of `key`, re-serialised.
  pub fn export_records(&self, key: &str) -> Result<String> {
    validate_key(key)?;
    let value: Value = read_json(&self.records_path(key))?
      .ok_or_else(|| Error::RecordsNotFound(key.to_owned()))?;
    to_pretty_string(&value)
  }
}
