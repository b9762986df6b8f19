//! Error type for `sgc-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] sgc_core::Error),

  #[error("i/o error on {}: {source}", .path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("template not found: {0}")]
  TemplateNotFound(String),

  #[error("no records stored for template {0}")]
  RecordsNotFound(String),

  /// Stored or imported content is not well-formed JSON of the expected
  /// shape.
  #[error("corrupt data in {location}: {source}")]
  CorruptData {
    location: String,
    #[source]
    source:   serde_json::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    match self {
      Self::TemplateNotFound(_) | Self::RecordsNotFound(_) => true,
      Self::Core(e) => e.is_not_found(),
      _ => false,
    }
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_validation())
  }

  pub fn is_corrupt(&self) -> bool { matches!(self, Self::CorruptData { .. }) }

  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
