//! The `TemplateStore` and `RecordStore` traits, plus an in-memory backend.
//!
//! The traits are implemented by storage backends (e.g. `sgc-store-json`).
//! Higher layers (the form engine, `sgc-cli`) depend on these abstractions,
//! not on any concrete backend. Everything is synchronous; a store is used
//! from a single interactive session at a time.

use std::{
  cell::RefCell,
  collections::{BTreeMap, HashMap},
};

use crate::{Error, record::Record, template::Template};

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Persistence of templates, keyed by template name.
pub trait TemplateStore {
  type Error: std::error::Error + From<Error> + 'static;

  /// Iterator returned by [`list_templates`](Self::list_templates).
  type Keys<'a>: Iterator<Item = Result<String, Self::Error>>
  where
    Self: 'a;

  /// Enumerate the keys of all stored templates. The sequence is lazy and
  /// finite; calling again restarts it. Keys used for record persistence are
  /// never yielded. No particular order is guaranteed.
  fn list_templates(&self) -> Result<Self::Keys<'_>, Self::Error>;

  /// Load the template stored under `key`. Fails with a not-found error if
  /// there is none and a corrupt-data error if the stored form is malformed.
  fn load_template(&self, key: &str) -> Result<Template, Self::Error>;

  /// Write `template` under `template.name`, replacing any existing one.
  /// There is no conflict detection: the last writer wins.
  fn store_template(&self, template: &Template) -> Result<(), Self::Error>;

  /// Remove the template stored under `key`. Records stored for it are left
  /// untouched.
  fn delete_template(&self, key: &str) -> Result<(), Self::Error>;

  fn template_exists(&self, key: &str) -> Result<bool, Self::Error>;
}

/// Append-only persistence of records, grouped by template key.
pub trait RecordStore {
  type Error: std::error::Error + From<Error> + 'static;

  /// All records stored for `template_key`, in insertion order. A template
  /// with no stored records yields an empty vector.
  fn load_records(&self, template_key: &str) -> Result<Vec<Record>, Self::Error>;

  /// Append `record` to the records of `template_key`. Implementations may
  /// rewrite the whole collection; callers must not assume appends are cheap.
  fn append_record(
    &self,
    template_key: &str,
    record: &Record,
  ) -> Result<(), Self::Error>;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A store that keeps everything in memory, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
  templates: RefCell<BTreeMap<String, Template>>,
  records:   RefCell<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl TemplateStore for MemoryStore {
  type Error = Error;
  type Keys<'a> = std::vec::IntoIter<Result<String, Error>>;

  fn list_templates(&self) -> Result<Self::Keys<'_>, Error> {
    let keys: Vec<_> = self.templates.borrow().keys().cloned().map(Ok).collect();
    Ok(keys.into_iter())
  }

  fn load_template(&self, key: &str) -> Result<Template, Error> {
    self
      .templates
      .borrow()
      .get(key)
      .cloned()
      .ok_or_else(|| Error::TemplateNotFound(key.to_owned()))
  }

  fn store_template(&self, template: &Template) -> Result<(), Error> {
    self
      .templates
      .borrow_mut()
      .insert(template.name.clone(), template.clone());
    Ok(())
  }

  fn delete_template(&self, key: &str) -> Result<(), Error> {
    self
      .templates
      .borrow_mut()
      .remove(key)
      .map(drop)
      .ok_or_else(|| Error::TemplateNotFound(key.to_owned()))
  }

  fn template_exists(&self, key: &str) -> Result<bool, Error> {
    Ok(self.templates.borrow().contains_key(key))
  }
}

impl RecordStore for MemoryStore {
  type Error = Error;

  fn load_records(&self, template_key: &str) -> Result<Vec<Record>, Error> {
    Ok(
      self
        .records
        .borrow()
        .get(template_key)
        .cloned()
        .unwrap_or_default(),
    )
  }

  fn append_record(&self, template_key: &str, record: &Record) -> Result<(), Error> {
    self
      .records
      .borrow_mut()
      .entry(template_key.to_owned())
      .or_default()
      .push(record.clone());
    Ok(())
  }
}
