//! Layered configuration: built-in defaults, then the optional TOML file,
//! then `SGC_*` environment variables. Command-line flags are applied on top
//! by `main`.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;
use sgc_core::template::FieldLimits;

/// Runtime settings, deserialised from `sgc.toml` and the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Directory holding template files.
  pub data_dir:        PathBuf,
  /// Directory holding record files; relative paths are resolved against
  /// `data_dir`.
  pub records_dir:     PathBuf,
  /// Whether submitted records are written to disk or only kept for the
  /// session.
  pub persist_records: bool,
  pub min_fields:      usize,
  pub max_fields:      usize,
  /// Where the terminal UI writes its log.
  pub log_file:        PathBuf,
}

impl Settings {
  /// Load settings. A missing file is only an error when `explicit` is set.
  pub fn load(file: &Path, explicit: bool) -> anyhow::Result<Self> {
    Self::load_with_env(file, explicit, None)
  }

  /// Like [`load`](Self::load), reading `SGC_*` variables from `env`
  /// instead of the process environment when it is given.
  pub fn load_with_env(
    file: &Path,
    explicit: bool,
    env: Option<HashMap<String, String>>,
  ) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("data_dir", ".")?
      .set_default("records_dir", "registros")?
      .set_default("persist_records", true)?
      .set_default("min_fields", 1_i64)?
      .set_default("max_fields", 50_i64)?
      .set_default("log_file", "sgc.log")?
      .add_source(config::File::from(file.to_path_buf()).required(explicit))
      .add_source(config::Environment::with_prefix("SGC").source(env))
      .build()
      .with_context(|| format!("failed to read configuration from {}", file.display()))?;

    let settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    anyhow::ensure!(
      settings.min_fields >= 1 && settings.min_fields <= settings.max_fields,
      "invalid field limits: min_fields={} max_fields={}",
      settings.min_fields,
      settings.max_fields
    );
    Ok(settings)
  }

  pub fn field_limits(&self) -> FieldLimits {
    FieldLimits {
      min: self.min_fields,
      max: self.max_fields,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("missing.toml"), false).unwrap();
    assert_eq!(settings.records_dir, PathBuf::from("registros"));
    assert!(settings.persist_records);
    assert_eq!(settings.field_limits(), FieldLimits::default());
  }

  #[test]
  fn explicit_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Settings::load(&dir.path().join("missing.toml"), true).is_err());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sgc.toml");
    fs::write(&path, "persist_records = false\nmax_fields = 10\n").unwrap();
    let settings = Settings::load(&path, true).unwrap();
    assert!(!settings.persist_records);
    assert_eq!(settings.field_limits(), FieldLimits { min: 1, max: 10 });
  }

  #[test]
  fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sgc.toml");
    fs::write(&path, "max_fields = 10\nrecords_dir = \"datos\"\n").unwrap();
    let env = HashMap::from([
      ("SGC_MAX_FIELDS".to_owned(), "20".to_owned()),
      ("SGC_PERSIST_RECORDS".to_owned(), "false".to_owned()),
      ("OTHER_MAX_FIELDS".to_owned(), "99".to_owned()),
    ]);
    let settings = Settings::load_with_env(&path, true, Some(env)).unwrap();
    assert_eq!(settings.field_limits(), FieldLimits { min: 1, max: 20 });
    assert!(!settings.persist_records);
    assert_eq!(settings.records_dir, PathBuf::from("datos"));
  }

  #[test]
  fn inverted_limits_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sgc.toml");
    fs::write(&path, "min_fields = 5\nmax_fields = 2\n").unwrap();
    assert!(Settings::load(&path, true).is_err());
  }
}
