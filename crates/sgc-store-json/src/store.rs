//! [`JsonStore`]: the JSON file implementation of [`TemplateStore`] and
//! [`RecordStore`].

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use sgc_core::{
  record::Record,
  store::{RecordStore, TemplateStore},
  template::{RECORDS_SUFFIX, Template, validate_key},
};

use crate::{
  Error, Result,
  codec::{read_json, write_json},
};

const EXTENSION: &str = "json";

// ─── Store ───────────────────────────────────────────────────────────────────

/// Templates as `<template_dir>/<name>.json`, records as
/// `<records_dir>/<name>_datos.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
  template_dir: PathBuf,
  records_dir:  PathBuf,
}

impl JsonStore {
  /// Open a store rooted at `template_dir`, creating the directory if it
  /// does not exist. A relative `records_dir` is resolved against
  /// `template_dir`; it is created on the first record write.
  pub fn open(template_dir: impl Into<PathBuf>, records_dir: impl AsRef<Path>) -> Result<Self> {
    let template_dir = template_dir.into();
    fs::create_dir_all(&template_dir).map_err(|e| Error::io(&template_dir, e))?;
    let records_dir = template_dir.join(records_dir);
    tracing::debug!(
      templates = %template_dir.display(),
      records = %records_dir.display(),
      "opened json store"
    );
    Ok(Self {
      template_dir,
      records_dir,
    })
  }

  pub fn template_dir(&self) -> &Path { &self.template_dir }

  pub fn records_dir(&self) -> &Path { &self.records_dir }

  pub fn template_path(&self, key: &str) -> PathBuf {
    self.template_dir.join(format!("{key}.{EXTENSION}"))
  }

  pub fn records_path(&self, key: &str) -> PathBuf {
    self.records_dir.join(format!("{key}{RECORDS_SUFFIX}.{EXTENSION}"))
  }

  /// Older installations named record files after the full template file
  /// name, `<name>.json_datos.json`. Read as a fallback only.
  pub fn legacy_records_path(&self, key: &str) -> PathBuf {
    self
      .records_dir
      .join(format!("{key}.{EXTENSION}{RECORDS_SUFFIX}.{EXTENSION}"))
  }
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// Lazy listing of the template directory.
pub struct TemplateKeys {
  dir:         PathBuf,
  entries:     fs::ReadDir,
  records_dir: PathBuf,
}

impl Iterator for TemplateKeys {
  type Item = Result<String>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let entry = match self.entries.next()? {
        Ok(entry) => entry,
        Err(e) => return Some(Err(Error::io(&self.dir, e))),
      };
      let path = entry.path();
      if path == self.records_dir {
        continue;
      }
      match entry.file_type() {
        Ok(t) if t.is_file() => {}
        Ok(_) => continue,
        Err(e) => return Some(Err(Error::io(path, e))),
      }
      if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        continue;
      }
      let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      if stem.ends_with(RECORDS_SUFFIX) || stem.starts_with('.') {
        continue;
      }
      if let Err(e) = validate_key(stem) {
        tracing::warn!(path = %path.display(), error = %e, "skipping template file");
        continue;
      }
      return Some(Ok(stem.to_owned()));
    }
  }
}

impl TemplateStore for JsonStore {
  type Error = Error;
  type Keys<'a> = TemplateKeys;

  fn list_templates(&self) -> Result<TemplateKeys> {
    let entries =
      fs::read_dir(&self.template_dir).map_err(|e| Error::io(&self.template_dir, e))?;
    Ok(TemplateKeys {
      dir: self.template_dir.clone(),
      entries,
      records_dir: self.records_dir.clone(),
    })
  }

  fn load_template(&self, key: &str) -> Result<Template> {
    validate_key(key)?;
    let path = self.template_path(key);
    tracing::debug!(key, path = %path.display(), "loading template");
    let mut template: Template =
      read_json(&path)?.ok_or_else(|| Error::TemplateNotFound(key.to_owned()))?;
    // The file name is the key; records and edits follow it.
    if template.name != key {
      tracing::warn!(key, name = %template.name, "template name differs from its file name");
      template.name = key.to_owned();
    }
    Ok(template)
  }

  fn store_template(&self, template: &Template) -> Result<()> {
    validate_key(&template.name)?;
    let path = self.template_path(&template.name);
    write_json(&path, template)?;
    tracing::info!(
      key = %template.name,
      fields = template.fields.len(),
      "stored template"
    );
    Ok(())
  }

  fn delete_template(&self, key: &str) -> Result<()> {
    validate_key(key)?;
    let path = self.template_path(key);
    match fs::remove_file(&path) {
      Ok(()) => {
        tracing::info!(key, "deleted template");
        Ok(())
      }
      Err(e) if e.kind() == ErrorKind::NotFound => {
        Err(Error::TemplateNotFound(key.to_owned()))
      }
      Err(e) => Err(Error::io(path, e)),
    }
  }

  fn template_exists(&self, key: &str) -> Result<bool> {
    validate_key(key)?;
    Ok(self.template_path(key).is_file())
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

impl RecordStore for JsonStore {
  type Error = Error;

  fn load_records(&self, template_key: &str) -> Result<Vec<Record>> {
    validate_key(template_key)?;
    let records: Vec<Record> = match read_json(&self.records_path(template_key))? {
      Some(records) => records,
      None => read_json(&self.legacy_records_path(template_key))?.unwrap_or_default(),
    };
    tracing::debug!(key = template_key, count = records.len(), "loaded records");
    Ok(records)
  }

  fn append_record(&self, template_key: &str, record: &Record) -> Result<()> {
    let mut records = self.load_records(template_key)?;
    records.push(record.clone());
    write_json(&self.records_path(template_key), &records)?;
    tracing::info!(key = template_key, count = records.len(), "appended record");
    Ok(())
  }
}
