//! Error types for `sgc-core`.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("template name must not be empty")]
  EmptyTemplateName,

  #[error("template name {0:?} cannot be used as a file name")]
  UnsafeTemplateName(String),

  #[error("template {0:?} has no fields")]
  NoFields(String),

  #[error("field count {count} is outside the allowed range {min}..={max}")]
  FieldCountOutOfRange { count: usize, min: usize, max: usize },

  #[error("field {position} has an empty name")]
  EmptyFieldName { position: usize },

  #[error("field name {0:?} is used more than once")]
  DuplicateFieldName(String),

  #[error("choice field {0:?} has no options")]
  EmptyChoiceOptions(String),

  #[error("field index {index} is out of range for a template with {len} fields")]
  FieldIndexOutOfRange { index: usize, len: usize },

  #[error("invalid value {raw:?} for field {field:?}: {reason}")]
  InvalidValue {
    field:  String,
    raw:    String,
    reason: &'static str,
  },

  #[error("template not found: {0}")]
  TemplateNotFound(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether this is a schema validation failure that should be shown
  /// inline next to the form, with nothing written.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::EmptyTemplateName
        | Self::UnsafeTemplateName(_)
        | Self::NoFields(_)
        | Self::FieldCountOutOfRange { .. }
        | Self::EmptyFieldName { .. }
        | Self::DuplicateFieldName(_)
        | Self::EmptyChoiceOptions(_)
        | Self::InvalidValue { .. }
    )
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::TemplateNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A live choice value that is no longer one of the field's options, usually
/// because the template was edited after the value was entered. The value
/// has been replaced with `fallback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleChoiceWarning {
  pub field:    String,
  pub stale:    String,
  pub fallback: String,
}

impl fmt::Display for StaleChoiceWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{:?} is no longer an option for {:?}; using {:?}",
      self.stale, self.field, self.fallback
    )
  }
}
