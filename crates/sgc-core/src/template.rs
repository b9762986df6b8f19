//! Templates (named, ordered field schemas) and the two ways of authoring
//! them: a [`TemplateDraft`] for new templates and a [`TemplateEditor`] for
//! stored ones.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  field::FieldDefinition,
  store::TemplateStore,
};

/// File-name suffix reserved for record files. A template name may not end
/// with it, so template and record files can never be confused.
pub const RECORDS_SUFFIX: &str = "_datos";

// ─── FieldLimits ─────────────────────────────────────────────────────────────

/// Bounds on how many fields a new template can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
  pub min: usize,
  pub max: usize,
}

impl Default for FieldLimits {
  fn default() -> Self { Self { min: 1, max: 50 } }
}

impl FieldLimits {
  pub fn check(&self, count: usize) -> Result<()> {
    if count < self.min || count > self.max {
      return Err(Error::FieldCountOutOfRange {
        count,
        min: self.min,
        max: self.max,
      });
    }
    Ok(())
  }
}

// ─── Template ────────────────────────────────────────────────────────────────

/// A named schema. The name doubles as the persistence key; field order is
/// the rendering and column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
  #[serde(rename = "nombre")]
  pub name:   String,
  #[serde(rename = "campos", default)]
  pub fields: Vec<FieldDefinition>,
}

impl Template {
  pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
    Self {
      name: name.into(),
      fields,
    }
  }

  /// A template with `field_count` blank fields.
  pub fn create(
    name: impl Into<String>,
    field_count: usize,
    limits: FieldLimits,
  ) -> Result<Self> {
    limits.check(field_count)?;
    Ok(Self::new(name, vec![FieldDefinition::blank(); field_count]))
  }

  pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
    self.fields.iter().find(|f| f.name == name)
  }

  /// The name of the first field, which keys rows in the record table.
  pub fn key_field(&self) -> Option<&str> {
    self.fields.first().map(|f| f.name.as_str())
  }

  /// Check everything that must hold before the template is persisted.
  pub fn validate(&self) -> Result<()> {
    validate_key(&self.name)?;
    if self.fields.is_empty() {
      return Err(Error::NoFields(self.name.clone()));
    }
    let mut seen = HashSet::new();
    for (position, field) in self.fields.iter().enumerate() {
      field.validate(position)?;
      if !seen.insert(field.name.as_str()) {
        return Err(Error::DuplicateFieldName(field.name.clone()));
      }
    }
    Ok(())
  }
}

/// Check that `name` can be used as a template key, i.e. as a file name.
pub fn validate_key(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::EmptyTemplateName);
  }
  let unsafe_name = name.starts_with('.')
    || name.ends_with(RECORDS_SUFFIX)
    || name.chars().any(|c| {
      c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
    });
  if unsafe_name {
    return Err(Error::UnsafeTemplateName(name.to_owned()));
  }
  Ok(())
}

// ─── TemplateDraft ───────────────────────────────────────────────────────────

/// The in-progress field buffer of a template being created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateDraft {
  pub name:   String,
  pub fields: Vec<FieldDefinition>,
}

impl TemplateDraft {
  pub fn create(
    name: impl Into<String>,
    field_count: usize,
    limits: FieldLimits,
  ) -> Result<Self> {
    let Template { name, fields } = Template::create(name, field_count, limits)?;
    Ok(Self { name, fields })
  }

  pub fn is_empty(&self) -> bool { self.name.is_empty() && self.fields.is_empty() }

  /// Change the number of fields. The first `min(old, new)` fields keep
  /// their in-progress edits; fields past the new end are discarded and new
  /// slots start blank.
  pub fn resize(&mut self, field_count: usize, limits: FieldLimits) -> Result<()> {
    limits.check(field_count)?;
    self.fields.resize_with(field_count, FieldDefinition::blank);
    Ok(())
  }

  pub fn field_mut(&mut self, index: usize) -> Result<&mut FieldDefinition> {
    let len = self.fields.len();
    self
      .fields
      .get_mut(index)
      .ok_or(Error::FieldIndexOutOfRange { index, len })
  }

  pub fn to_template(&self) -> Template {
    Template::new(self.name.clone(), self.fields.clone())
  }

  /// Validate and persist the draft, then reset it so the next template
  /// starts from scratch. On failure nothing is written and the draft is
  /// kept.
  pub fn save<S: TemplateStore>(&mut self, store: &S) -> Result<Template, S::Error> {
    let template = self.to_template();
    template.validate()?;
    store.store_template(&template)?;
    *self = Self::default();
    Ok(template)
  }
}

// ─── TemplateEditor ──────────────────────────────────────────────────────────

/// Edits a stored template in place. Field changes are applied by position
/// and only reach the store on [`save_changes`](Self::save_changes); until
/// then the stored version is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEditor {
  key:      String,
  template: Template,
}

impl TemplateEditor {
  pub fn open<S: TemplateStore>(store: &S, key: &str) -> Result<Self, S::Error> {
    let template = store.load_template(key)?;
    Ok(Self::from_template(key, template))
  }

  pub fn from_template(key: impl Into<String>, template: Template) -> Self {
    Self {
      key: key.into(),
      template,
    }
  }

  pub fn key(&self) -> &str { &self.key }

  pub fn template(&self) -> &Template { &self.template }

  pub fn fields(&self) -> &[FieldDefinition] { &self.template.fields }

  pub fn field_mut(&mut self, index: usize) -> Result<&mut FieldDefinition> {
    let len = self.template.fields.len();
    self
      .template
      .fields
      .get_mut(index)
      .ok_or(Error::FieldIndexOutOfRange { index, len })
  }

  /// Replace the field at `index` wholesale.
  pub fn set_field(&mut self, index: usize, field: FieldDefinition) -> Result<()> {
    *self.field_mut(index)? = field;
    Ok(())
  }

  /// Validate and write the whole template back under the key it was opened with.
  pub fn save_changes<S: TemplateStore>(&mut self, store: &S) -> Result<(), S::Error> {
    self.template.name = self.key.clone();
    self.template.validate()?;
    store.store_template(&self.template)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{field::FieldType, store::MemoryStore};

  fn gastos() -> Template {
    Template::new(
      "Gastos",
      vec![
        FieldDefinition::new("Concepto", FieldType::Text),
        FieldDefinition::totalled("Monto"),
        FieldDefinition::choice("Pago", "Efectivo,Tarjeta"),
      ],
    )
  }

  #[test]
  fn create_produces_blank_text_fields() {
    let t = Template::create("X", 3, FieldLimits::default()).unwrap();
    assert_eq!(t.fields.len(), 3);
    assert!(t.fields.iter().all(|f| {
      f.field_type == FieldType::Text
        && !f.required
        && f.options.is_empty()
        && !f.include_in_total
    }));
  }

  #[test]
  fn create_rejects_zero_fields() {
    let err = Template::create("X", 0, FieldLimits::default()).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, Error::FieldCountOutOfRange { count: 0, .. }));
  }

  #[test]
  fn create_respects_configured_maximum() {
    let limits = FieldLimits { min: 1, max: 5 };
    assert!(Template::create("X", 5, limits).is_ok());
    assert!(Template::create("X", 6, limits).is_err());
    assert!(Template::create("X", 51, FieldLimits::default()).is_err());
  }

  #[test]
  fn parses_stored_format() {
    let t: Template = serde_json::from_value(json!({
      "nombre": "Gastos",
      "campos": [{"nombre": "Monto", "tipo": "Número", "incluir_total": true}]
    }))
    .unwrap();
    assert_eq!(t.name, "Gastos");
    assert!(t.fields[0].counts_toward_total());
  }

  #[test]
  fn validate_rejects_bad_templates() {
    let mut t = gastos();
    t.name = String::new();
    assert!(matches!(t.validate(), Err(Error::EmptyTemplateName)));

    let t = Template::new("Vacía", vec![]);
    assert!(matches!(t.validate(), Err(Error::NoFields(_))));

    let mut t = gastos();
    t.fields[2].name = "Monto".into();
    assert!(matches!(t.validate(), Err(Error::DuplicateFieldName(n)) if n == "Monto"));

    let mut t = gastos();
    t.fields[2].options.clear();
    assert!(matches!(t.validate(), Err(Error::EmptyChoiceOptions(_))));

    assert!(gastos().validate().is_ok());
  }

  #[test]
  fn unsafe_keys_are_rejected() {
    for name in ["../x", "a/b", "a\\b", ".hidden", "Gastos_datos", "a\nb"] {
      assert!(
        matches!(validate_key(name), Err(Error::UnsafeTemplateName(_))),
        "{name:?} accepted"
      );
    }
    assert!(validate_key("Gastos del mes").is_ok());
  }

  #[test]
  fn resize_keeps_prefix_edits() {
    let limits = FieldLimits::default();
    let mut draft = TemplateDraft::create("X", 3, limits).unwrap();
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
      draft.field_mut(i).unwrap().name = name.into();
    }
    draft.resize(5, limits).unwrap();
    assert_eq!(draft.fields.len(), 5);
    assert_eq!(draft.fields[..3].iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), [
      "a", "b", "c"
    ]);
    assert_eq!(draft.fields[3], FieldDefinition::blank());
    assert_eq!(draft.fields[4], FieldDefinition::blank());

    draft.field_mut(4).unwrap().name = "e".into();
    draft.resize(3, limits).unwrap();
    draft.resize(5, limits).unwrap();
    assert_eq!(draft.fields[4], FieldDefinition::blank());
    assert!(draft.resize(0, limits).is_err());
  }

  #[test]
  fn saving_a_draft_clears_it() {
    let store = MemoryStore::new();
    let mut draft = TemplateDraft::create("Gastos", 1, FieldLimits::default()).unwrap();
    *draft.field_mut(0).unwrap() = FieldDefinition::totalled("Monto");

    let saved = draft.save(&store).unwrap();
    assert!(draft.is_empty());
    assert_eq!(store.load_template("Gastos").unwrap(), saved);
  }

  #[test]
  fn invalid_draft_is_not_written() {
    let store = MemoryStore::new();
    let mut draft = TemplateDraft::create("Gastos", 2, FieldLimits::default()).unwrap();
    let err = draft.save(&store).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(draft.fields.len(), 2);
    assert!(!store.template_exists("Gastos").unwrap());
  }

  #[test]
  fn editor_saves_under_opened_key() {
    let store = MemoryStore::new();
    store.store_template(&gastos()).unwrap();

    let mut editor = TemplateEditor::open(&store, "Gastos").unwrap();
    let mut field = editor.fields()[0].clone();
    field.required = true;
    editor.set_field(0, field).unwrap();
    assert!(!store.load_template("Gastos").unwrap().fields[0].required);

    editor.save_changes(&store).unwrap();
    assert!(store.load_template("Gastos").unwrap().fields[0].required);
    assert!(editor.set_field(9, FieldDefinition::blank()).is_err());
  }

  #[test]
  fn editor_open_missing_template() {
    let store = MemoryStore::new();
    let err = TemplateEditor::open(&store, "Nada").unwrap_err();
    assert!(err.is_not_found());
  }
}
