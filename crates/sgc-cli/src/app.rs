//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use sgc_core::{
  field::{FieldDefinition, FieldType},
  form::{FormEngine, FormSession},
  store::TemplateStore,
  template::{FieldLimits, Template, TemplateDraft, TemplateEditor},
  value::FieldValue,
};
use sgc_store_json::{JsonStore, import_file, to_pretty_string};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the template list; the right pane previews the selected form.
  Templates,
  /// Focus on the form of the open template.
  Form,
  /// Creating or editing a template's fields.
  Editor,
  /// Read-only JSON document (consult, export, import).
  Viewer,
}

// ─── Line input ───────────────────────────────────────────────────────────────

/// What a line of typed text will be applied to on Enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
  FieldValue(usize),
  NewTemplateName,
  NewTemplateFieldCount,
  FieldName(usize),
  FieldOptions(usize),
  FieldDefault(usize),
  FieldCount,
  ImportPath,
}

impl InputTarget {
  pub fn label(self) -> &'static str {
    match self {
      Self::FieldValue(_) => "Value",
      Self::NewTemplateName => "Template name",
      Self::NewTemplateFieldCount | Self::FieldCount => "Number of fields",
      Self::FieldName(_) => "Field name",
      Self::FieldOptions(_) => "Options (comma-separated)",
      Self::FieldDefault(_) => "Default value",
      Self::ImportPath => "JSON file to import",
    }
  }
}

#[derive(Debug, Clone)]
pub struct LineInput {
  pub target: InputTarget,
  pub buffer: String,
}

// ─── Editor / viewer state ────────────────────────────────────────────────────

/// Which template the editor is working on.
#[derive(Debug)]
pub enum EditorMode {
  /// A new template; the fields live in the session draft.
  Create,
  /// A stored template; changes reach the store on save.
  Edit(TemplateEditor),
}

#[derive(Debug)]
pub struct EditorState {
  pub mode:   EditorMode,
  pub cursor: usize,
}

#[derive(Debug)]
pub struct Viewer {
  pub title:  String,
  pub lines:  Vec<String>,
  pub scroll: usize,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  pub store: JsonStore,

  /// Whether submitted records are written to disk.
  pub persist_records: bool,

  pub limits: FieldLimits,

  /// Live form values, template draft and record cache.
  pub session: FormSession,

  /// Template keys found in the store, sorted.
  pub templates: Vec<String>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* template list.
  pub list_cursor: usize,

  /// The template whose form is open.
  pub template: Option<Template>,

  /// Cursor position within the open form's fields.
  pub form_cursor: usize,

  /// Active line editor, if the user is typing a value.
  pub input: Option<LineInput>,

  pub editor: Option<EditorState>,

  pub viewer: Option<Viewer>,

  /// Template key awaiting delete confirmation.
  pub pending_delete: Option<String>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(store: JsonStore, persist_records: bool, limits: FieldLimits) -> Self {
    Self {
      screen: Screen::Templates,
      store,
      persist_records,
      limits,
      session: FormSession::new(),
      templates: Vec::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      template: None,
      form_cursor: 0,
      input: None,
      editor: None,
      viewer: None,
      pending_delete: None,
      status_msg: String::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-read the template keys from the store.
  pub fn load_templates(&mut self) -> anyhow::Result<()> {
    let mut keys = self
      .store
      .list_templates()?
      .collect::<Result<Vec<_>, _>>()?;
    keys.sort();
    self.templates = keys;
    self.list_cursor = 0;
    if self.templates.is_empty() {
      self.status_msg = "No templates saved yet. Press n to create one.".into();
    }
    Ok(())
  }

  /// Load `key` into the form pane, seed its defaults and load its records.
  fn open_template(&mut self, key: &str) {
    let template = match self.store.load_template(key) {
      Ok(t) => t,
      Err(e) => {
        self.status_msg = if e.is_not_found() {
          format!("Template {key:?} no longer exists.")
        } else {
          format!("Error: {e}")
        };
        self.template = None;
        return;
      }
    };
    self.session.initialize_defaults(&template);
    let warnings = self.session.reconcile_choices(&template);
    let engine = FormEngine::new(&self.store, self.persist_records);
    self.status_msg = match engine.records(&mut self.session, &template.name) {
      Err(e) => format!("Could not load records: {e}"),
      Ok(_) => warnings
        .first()
        .map(ToString::to_string)
        .unwrap_or_default(),
    };
    self.form_cursor = 0;
    self.template = Some(template);
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns template keys that match the current filter query.
  pub fn filtered_templates(&self) -> Vec<&str> {
    if self.filter.is_empty() {
      return self.templates.iter().map(String::as_str).collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .templates
      .iter()
      .filter(|k| matcher.fuzzy_match(k, &self.filter).is_some())
      .map(String::as_str)
      .collect()
  }

  /// The template key under the list cursor in the filtered view, if any.
  pub fn cursor_template(&self) -> Option<&str> {
    self.filtered_templates().get(self.list_cursor).copied()
  }

  /// Fields shown by the editor.
  pub fn editor_fields(&self) -> &[FieldDefinition] {
    match self.editor.as_ref().map(|e| &e.mode) {
      Some(EditorMode::Create) => &self.session.draft.fields,
      Some(EditorMode::Edit(editor)) => editor.fields(),
      None => &[],
    }
  }

  /// Name of the template in the editor.
  pub fn editor_name(&self) -> &str {
    match self.editor.as_ref().map(|e| &e.mode) {
      Some(EditorMode::Create) => &self.session.draft.name,
      Some(EditorMode::Edit(editor)) => editor.key(),
      None => "",
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.input.is_some() {
      self.handle_input_key(key);
      return Ok(true);
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    if let Some(pending) = self.pending_delete.take() {
      self.confirm_delete(&pending, key.code == KeyCode::Char('y'))?;
      return Ok(true);
    }

    match self.screen {
      Screen::Templates => self.handle_list_key(key),
      Screen::Form => Ok(self.handle_form_key(key)),
      Screen::Editor => Ok(self.handle_editor_key(key)),
      Screen::Viewer => Ok(self.handle_viewer_key(key)),
    }
  }

  fn start_input(&mut self, target: InputTarget, initial: String) {
    self.input = Some(LineInput {
      target,
      buffer: initial,
    });
  }

  fn handle_input_key(&mut self, key: KeyEvent) {
    let Some(input) = self.input.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Esc => {
        self.input = None;
      }
      KeyCode::Enter => {
        if let Some(LineInput { target, buffer }) = self.input.take() {
          self.commit_input(target, buffer);
        }
      }
      KeyCode::Backspace => {
        input.buffer.pop();
      }
      KeyCode::Char(c) => input.buffer.push(c),
      _ => {}
    }
  }

  fn commit_input(&mut self, target: InputTarget, buffer: String) {
    match target {
      InputTarget::FieldValue(index) => {
        let Some(template) = self.template.as_ref() else {
          return;
        };
        self.status_msg = match self.session.capture(template, index, &buffer) {
          Ok(Some(warning)) => {
            tracing::warn!(%warning, "stale choice");
            warning.to_string()
          }
          Ok(None) => String::new(),
          Err(e) => e.to_string(),
        };
      }
      InputTarget::NewTemplateName => {
        if buffer.trim().is_empty() {
          self.status_msg = "Enter a name for the template to continue.".into();
          return;
        }
        self.session.draft.name = buffer;
        self.start_input(InputTarget::NewTemplateFieldCount, self.limits.min.to_string());
      }
      InputTarget::NewTemplateFieldCount => {
        let name = std::mem::take(&mut self.session.draft.name);
        let created = parse_count(&buffer)
          .and_then(|n| TemplateDraft::create(name, n, self.limits).map_err(|e| e.to_string()));
        match created {
          Ok(draft) => {
            self.session.draft = draft;
            self.editor = Some(EditorState {
              mode:   EditorMode::Create,
              cursor: 0,
            });
            self.screen = Screen::Editor;
            self.status_msg = String::new();
          }
          Err(e) => self.status_msg = e,
        }
      }
      InputTarget::FieldCount => {
        let resized = parse_count(&buffer).and_then(|n| {
          self
            .session
            .draft
            .resize(n, self.limits)
            .map_err(|e| e.to_string())
        });
        if let Err(e) = resized {
          self.status_msg = e;
        }
        self.clamp_editor_cursor();
      }
      InputTarget::FieldName(index) => {
        self.edit_field(index, |f| f.name = buffer.trim().to_owned());
      }
      InputTarget::FieldOptions(index) => {
        self.edit_field(index, |f| f.set_options(&buffer));
      }
      InputTarget::FieldDefault(index) => {
        let raw = buffer.trim();
        let parsed = if raw.is_empty() {
          Ok(None)
        } else {
          raw.parse::<f64>().map(Some)
        };
        match parsed {
          Ok(default) => self.edit_field(index, |f| f.default_value = default),
          Err(_) => self.status_msg = format!("{raw:?} is not a number"),
        }
      }
      InputTarget::ImportPath => {
        let path = std::path::PathBuf::from(buffer.trim());
        match import_file(&path).and_then(|v| to_pretty_string(&v)) {
          Ok(text) => self.open_viewer(format!("Imported {}", path.display()), &text),
          Err(e) => self.status_msg = format!("Import failed: {e}"),
        }
      }
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open the form if there's exactly one match.
        let list = self.filtered_templates();
        if list.len() == 1 {
          let key = list[0].to_owned();
          self.open_template(&key);
          self.screen = Screen::Form;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_templates().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
          self.preview_cursor();
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          self.preview_cursor();
        }
      }

      // Open form
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(key) = self.cursor_template().map(str::to_owned) {
          self.open_template(&key);
          if self.template.is_some() {
            self.screen = Screen::Form;
          }
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      // Template management
      KeyCode::Char('n') => {
        self.session.draft = TemplateDraft::default();
        self.start_input(InputTarget::NewTemplateName, String::new());
      }
      KeyCode::Char('e') => {
        if let Some(key) = self.cursor_template().map(str::to_owned) {
          match TemplateEditor::open(&self.store, &key) {
            Ok(editor) => {
              self.editor = Some(EditorState {
                mode:   EditorMode::Edit(editor),
                cursor: 0,
              });
              self.screen = Screen::Editor;
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }
      KeyCode::Char('v') => {
        if let Some(key) = self.cursor_template().map(str::to_owned) {
          match self.store.export_template(&key) {
            Ok(text) => self.open_viewer(format!("Template {key}"), &text),
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }
      KeyCode::Char('x') => {
        if let Some(key) = self.cursor_template().map(str::to_owned) {
          match self.store.export_records(&key) {
            Ok(text) => self.open_viewer(format!("Records of {key}"), &text),
            Err(e) if e.is_not_found() => {
              self.status_msg = format!("No records stored for {key:?} yet.");
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }
      KeyCode::Char('i') => self.start_input(InputTarget::ImportPath, String::new()),
      KeyCode::Char('D') => {
        if let Some(key) = self.cursor_template().map(str::to_owned) {
          self.status_msg = format!("Delete template {key:?}? Records are kept. [y/N]");
          self.pending_delete = Some(key);
        }
      }
      KeyCode::Char('r') => self.load_templates()?,

      _ => {}
    }
    Ok(true)
  }

  fn preview_cursor(&mut self) {
    if let Some(key) = self.cursor_template().map(str::to_owned) {
      self.open_template(&key);
    }
  }

  fn confirm_delete(&mut self, key: &str, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
      self.status_msg = String::new();
      return Ok(());
    }
    match self.store.delete_template(key) {
      Ok(()) => {
        self.status_msg = format!("Deleted template {key:?}.");
        if self.template.as_ref().is_some_and(|t| t.name == key) {
          self.template = None;
        }
        self.load_templates()?;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    Ok(())
  }

  fn handle_form_key(&mut self, key: KeyEvent) -> bool {
    let Some(template) = self.template.as_ref() else {
      self.screen = Screen::Templates;
      return true;
    };
    let field_count = template.fields.len();
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc => self.screen = Screen::Templates,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.form_cursor + 1 < field_count {
          self.form_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.form_cursor = self.form_cursor.saturating_sub(1);
      }

      // Type a new value for the field under the cursor.
      KeyCode::Enter => {
        if let Some(field) = template.fields.get(self.form_cursor) {
          let current = self
            .session
            .value(&template.name, &field.name)
            .map(ToString::to_string)
            .unwrap_or_default();
          self.start_input(InputTarget::FieldValue(self.form_cursor), current);
        }
      }

      // Cycle through the options of a choice field.
      KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
        let forward = matches!(key.code, KeyCode::Right | KeyCode::Char('l'));
        self.cycle_choice(forward);
      }

      KeyCode::Char('s') => self.submit(),

      KeyCode::Char('c') => {
        let template = template.clone();
        self.session.clear_fields(&template);
        self.session.initialize_defaults(&template);
        self.status_msg = "Fields cleared.".into();
      }

      _ => {}
    }
    true
  }

  fn cycle_choice(&mut self, forward: bool) {
    let Some(template) = self.template.as_ref() else {
      return;
    };
    let Some(field) = template.fields.get(self.form_cursor) else {
      return;
    };
    if field.field_type != FieldType::Choice || field.options.is_empty() {
      return;
    }
    let current = match self.session.value(&template.name, &field.name) {
      Some(FieldValue::Choice(c)) => field.options.iter().position(|o| o == c),
      _ => None,
    };
    let len = field.options.len();
    let next = match (current, forward) {
      (Some(i), true) => (i + 1) % len,
      (Some(i), false) => (i + len - 1) % len,
      (None, _) => 0,
    };
    let option = field.options[next].clone();
    if let Err(e) = self.session.capture(template, self.form_cursor, &option) {
      self.status_msg = e.to_string();
    }
  }

  fn submit(&mut self) {
    let Some(template) = self.template.as_ref() else {
      return;
    };
    let engine = FormEngine::new(&self.store, self.persist_records);
    match engine.submit(&mut self.session, template) {
      Ok(_) => {
        tracing::info!(template = %template.name, "record submitted");
        self.session.initialize_defaults(template);
        self.status_msg = if self.persist_records {
          "Record saved.".into()
        } else {
          "Record kept for this session (not written to disk).".into()
        };
      }
      Err(e) => self.status_msg = format!("Could not save record: {e}"),
    }
  }

  fn handle_editor_key(&mut self, key: KeyEvent) -> bool {
    let Some(editor) = self.editor.as_mut() else {
      self.screen = Screen::Templates;
      return true;
    };
    let cursor = editor.cursor;
    let creating = matches!(editor.mode, EditorMode::Create);
    let field_count = self.editor_fields().len();

    match key.code {
      KeyCode::Esc => {
        self.editor = None;
        self.screen = Screen::Templates;
        self.status_msg = "Changes discarded.".into();
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if cursor + 1 < field_count {
          self.set_editor_cursor(cursor + 1);
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.set_editor_cursor(cursor.saturating_sub(1)),

      KeyCode::Enter | KeyCode::Char('n') => {
        let name = self.editor_fields().get(cursor).map(|f| f.name.clone());
        if let Some(name) = name {
          self.start_input(InputTarget::FieldName(cursor), name);
        }
      }
      KeyCode::Char('t') => self.edit_field(cursor, |f| f.field_type = f.field_type.cycle()),
      KeyCode::Char('r') => self.edit_field(cursor, |f| f.required = !f.required),
      KeyCode::Char('i') => {
        self.edit_field(cursor, |f| f.include_in_total = !f.include_in_total);
      }
      KeyCode::Char('o') => {
        let options = self.editor_fields().get(cursor).map(FieldDefinition::options_text);
        if let Some(options) = options {
          self.start_input(InputTarget::FieldOptions(cursor), options);
        }
      }
      KeyCode::Char('d') => {
        let default = self
          .editor_fields()
          .get(cursor)
          .map(|f| f.default_value.map(|d| d.to_string()).unwrap_or_default());
        if let Some(default) = default {
          self.start_input(InputTarget::FieldDefault(cursor), default);
        }
      }
      KeyCode::Char('#') if creating => {
        self.start_input(InputTarget::FieldCount, field_count.to_string());
      }
      KeyCode::Char('+') if creating => {
        if let Err(e) = self.session.draft.resize(field_count + 1, self.limits) {
          self.status_msg = e.to_string();
        }
      }
      KeyCode::Char('-') if creating => {
        if let Err(e) = self.session.draft.resize(field_count.saturating_sub(1), self.limits) {
          self.status_msg = e.to_string();
        }
        self.clamp_editor_cursor();
      }

      KeyCode::Char('s') => self.save_editor(),

      _ => {}
    }
    true
  }

  fn set_editor_cursor(&mut self, cursor: usize) {
    if let Some(editor) = self.editor.as_mut() {
      editor.cursor = cursor;
    }
  }

  fn clamp_editor_cursor(&mut self) {
    let last = self.editor_fields().len().saturating_sub(1);
    if let Some(editor) = self.editor.as_mut() {
      editor.cursor = editor.cursor.min(last);
    }
  }

  /// Apply `change` to the editor's field at `index`.
  fn edit_field(&mut self, index: usize, change: impl FnOnce(&mut FieldDefinition)) {
    let field = match self.editor.as_mut().map(|e| &mut e.mode) {
      Some(EditorMode::Create) => self.session.draft.field_mut(index),
      Some(EditorMode::Edit(editor)) => editor.field_mut(index),
      None => return,
    };
    match field {
      Ok(field) => change(field),
      Err(e) => self.status_msg = e.to_string(),
    }
  }

  fn save_editor(&mut self) {
    let Some(state) = self.editor.as_mut() else {
      return;
    };
    let saved = match &mut state.mode {
      EditorMode::Create => self.session.draft.save(&self.store).map(|t| t.name),
      EditorMode::Edit(editor) => editor
        .save_changes(&self.store)
        .map(|()| editor.key().to_owned()),
    };
    match saved {
      Ok(key) => {
        self.status_msg = format!("Template {key:?} saved.");
        self.editor = None;
        self.screen = Screen::Templates;
        if let Err(e) = self.load_templates() {
          self.status_msg = format!("Error: {e}");
        }
        if let Some(pos) = self.templates.iter().position(|k| *k == key) {
          self.list_cursor = pos;
        }
        self.session.invalidate_records(&key);
        self.open_template(&key);
      }
      Err(e) => self.status_msg = e.to_string(),
    }
  }

  fn open_viewer(&mut self, title: String, text: &str) {
    self.viewer = Some(Viewer {
      title,
      lines: text.lines().map(str::to_owned).collect(),
      scroll: 0,
    });
    self.screen = Screen::Viewer;
  }

  fn handle_viewer_key(&mut self, key: KeyEvent) -> bool {
    let Some(viewer) = self.viewer.as_mut() else {
      self.screen = Screen::Templates;
      return true;
    };
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.viewer = None;
        self.screen = Screen::Templates;
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if viewer.scroll + 1 < viewer.lines.len() {
          viewer.scroll += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        viewer.scroll = viewer.scroll.saturating_sub(1);
      }
      _ => {}
    }
    true
  }
}

fn parse_count(raw: &str) -> Result<usize, String> {
  raw
    .trim()
    .parse()
    .map_err(|_| format!("{:?} is not a whole number", raw.trim()))
}
