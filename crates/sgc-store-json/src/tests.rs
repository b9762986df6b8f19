//! Integration tests for `JsonStore` against a temporary directory.

use std::{collections::HashSet, fs};

use chrono::NaiveDate;
use serde_json::json;
use sgc_core::{
  field::{FieldDefinition, FieldType},
  form::{FormEngine, FormSession},
  record::Record,
  store::{RecordStore, TemplateStore},
  table::RecordTable,
  template::{FieldLimits, Template, TemplateDraft},
  value::FieldValue,
};
use tempfile::TempDir;

use crate::{Error, JsonStore, import_document};

fn store() -> (TempDir, JsonStore) {
  let dir = tempfile::tempdir().expect("temp dir");
  let store = JsonStore::open(dir.path(), "registros").expect("json store");
  (dir, store)
}

fn gastos() -> Template {
  Template::new("Gastos", vec![FieldDefinition::totalled("Monto")])
}

fn inventario() -> Template {
  let mut cantidad = FieldDefinition::new("Cantidad", FieldType::Number);
  cantidad.default_value = Some(1.0);
  cantidad.required = true;
  Template::new(
    "Inventario",
    vec![
      FieldDefinition::new("Producto", FieldType::Text),
      cantidad,
      FieldDefinition::new("Llegada", FieldType::Date),
      FieldDefinition::new("Turno", FieldType::Time),
      FieldDefinition::choice("Estado", "Nuevo,Usado"),
    ],
  )
}

fn keys(store: &JsonStore) -> HashSet<String> {
  store
    .list_templates()
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap()
}

// ─── Templates ───────────────────────────────────────────────────────────────

#[test]
fn template_round_trip() {
  let (_dir, s) = store();
  for t in [gastos(), inventario()] {
    s.store_template(&t).unwrap();
    assert_eq!(s.load_template(&t.name).unwrap(), t);
  }
}

#[test]
fn stored_file_uses_persisted_format() {
  let (_dir, s) = store();
  s.store_template(&inventario()).unwrap();

  let raw = fs::read_to_string(s.template_path("Inventario")).unwrap();
  assert!(raw.contains("\n    \"nombre\": \"Inventario\""));
  let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(value["campos"][1], json!({
    "nombre": "Cantidad",
    "tipo": "Número",
    "obligatorio": true,
    "opciones": "",
    "incluir_total": false,
    "valor_default": 1.0
  }));
  assert_eq!(value["campos"][4]["opciones"], json!("Nuevo,Usado"));
}

#[test]
fn reads_hand_written_template() {
  let (dir, s) = store();
  fs::write(
    dir.path().join("Gastos.json"),
    r#"{"nombre":"Gastos","campos":[{"nombre":"Monto","tipo":"Número","incluir_total":true}]}"#,
  )
  .unwrap();
  assert_eq!(s.load_template("Gastos").unwrap(), gastos());
}

#[test]
fn file_name_is_the_key() {
  let (dir, s) = store();
  fs::write(
    dir.path().join("A.json"),
    r#"{"nombre":"B","campos":[{"nombre":"Monto","tipo":"Número"}]}"#,
  )
  .unwrap();
  fs::write(
    dir.path().join("C.json"),
    r#"{"nombre":"C/x","campos":[{"nombre":"Monto","tipo":"Número"}]}"#,
  )
  .unwrap();

  let engine = FormEngine::new(&s, true);
  let mut session = FormSession::new();
  for key in ["A", "C"] {
    let template = s.load_template(key).unwrap();
    assert_eq!(template.name, key);
    session.initialize_defaults(&template);
    session.capture(&template, 0, "7").unwrap();
    engine.submit(&mut session, &template).unwrap();
    assert_eq!(s.load_records(key).unwrap().len(), 1);
  }
  assert!(s.load_records("B").unwrap().is_empty());
}

#[test]
fn load_missing_template_is_not_found() {
  let (_dir, s) = store();
  let err = s.load_template("Nada").unwrap_err();
  assert!(matches!(err, Error::TemplateNotFound(ref k) if k == "Nada"));
  assert!(err.is_not_found());
}

#[test]
fn malformed_template_is_corrupt() {
  let (dir, s) = store();
  fs::write(dir.path().join("Roto.json"), "{\"nombre\": ").unwrap();
  fs::write(
    dir.path().join("Raro.json"),
    r#"{"nombre":"Raro","campos":[{"nombre":"x","tipo":"Color"}]}"#,
  )
  .unwrap();
  assert!(s.load_template("Roto").unwrap_err().is_corrupt());
  assert!(s.load_template("Raro").unwrap_err().is_corrupt());
}

#[test]
fn store_overwrites_existing() {
  let (_dir, s) = store();
  s.store_template(&gastos()).unwrap();
  let mut changed = gastos();
  changed.fields.push(FieldDefinition::new("Nota", FieldType::Text));
  s.store_template(&changed).unwrap();
  assert_eq!(s.load_template("Gastos").unwrap().fields.len(), 2);
}

#[test]
fn unsafe_names_never_touch_disk() {
  let (_dir, s) = store();
  let t = Template::new("../fuera", gastos().fields);
  let err = s.store_template(&t).unwrap_err();
  assert!(err.is_validation());
  assert!(s.load_template("../fuera").unwrap_err().is_validation());
}

#[test]
fn list_excludes_records_and_other_files() {
  let (dir, s) = store();
  s.store_template(&gastos()).unwrap();
  s.store_template(&inventario()).unwrap();
  let record: Record = [("Monto", FieldValue::Number(1.0))].into_iter().collect();
  s.append_record("Gastos", &record).unwrap();
  fs::write(dir.path().join("notas.txt"), "x").unwrap();
  fs::write(dir.path().join("Viejo_datos.json"), "[]").unwrap();

  let expected: HashSet<String> = ["Gastos", "Inventario"].map(String::from).into();
  assert_eq!(keys(&s), expected);
  // Restartable.
  assert_eq!(keys(&s), expected);
}

#[test]
fn list_skips_unusable_file_names() {
  let (dir, s) = store();
  s.store_template(&gastos()).unwrap();
  for name in ["a:b.json", "c*d.json", "e?.json"] {
    fs::write(dir.path().join(name), "{}").unwrap();
  }
  assert_eq!(keys(&s), HashSet::from(["Gastos".to_owned()]));
}

#[test]
fn writes_leave_no_temporary_files() {
  let (dir, s) = store();
  s.store_template(&gastos()).unwrap();
  s.store_template(&gastos()).unwrap();
  let record: Record = [("Monto", FieldValue::Number(1.0))].into_iter().collect();
  s.append_record("Gastos", &record).unwrap();

  let names = |path: &std::path::Path| -> Vec<String> {
    fs::read_dir(path)
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect()
  };
  let mut top = names(dir.path());
  top.sort();
  assert_eq!(top, ["Gastos.json", "registros"]);
  assert_eq!(names(s.records_dir()), ["Gastos_datos.json"]);
}

#[test]
fn list_empty_directory() {
  let (_dir, s) = store();
  assert!(keys(&s).is_empty());
}

#[test]
fn delete_removes_only_the_template() {
  let (_dir, s) = store();
  s.store_template(&gastos()).unwrap();
  let record: Record = [("Monto", FieldValue::Number(1.0))].into_iter().collect();
  s.append_record("Gastos", &record).unwrap();

  s.delete_template("Gastos").unwrap();
  assert!(!s.template_exists("Gastos").unwrap());
  assert_eq!(s.load_records("Gastos").unwrap().len(), 1);
  assert!(s.delete_template("Gastos").unwrap_err().is_not_found());
}

#[test]
fn saving_a_draft_persists_it() {
  let (_dir, s) = store();
  let mut draft = TemplateDraft::create("Nueva", 2, FieldLimits::default()).unwrap();
  draft.fields[0] = FieldDefinition::new("A", FieldType::Text);
  draft.fields[1] = FieldDefinition::choice("B", "x, y");
  draft.save(&s).unwrap();
  assert!(draft.is_empty());
  assert_eq!(s.load_template("Nueva").unwrap().fields[1].options, ["x", "y"]);
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[test]
fn records_start_empty() {
  let (_dir, s) = store();
  assert!(s.load_records("Gastos").unwrap().is_empty());
  assert!(!s.records_dir().exists());
}

#[test]
fn append_keeps_insertion_order() {
  let (_dir, s) = store();
  for i in 0..5 {
    let record: Record = [("n", FieldValue::Number(f64::from(i)))].into_iter().collect();
    s.append_record("Serie", &record).unwrap();
  }
  let loaded = s.load_records("Serie").unwrap();
  let values: Vec<_> = loaded.iter().map(|r| r.get("n").cloned()).collect();
  assert_eq!(
    values,
    (0..5).map(|i| Some(FieldValue::Number(f64::from(i)))).collect::<Vec<_>>()
  );
  assert!(s.records_path("Serie").ends_with("registros/Serie_datos.json"));
}

#[test]
fn legacy_records_file_is_read_and_migrated() {
  let (_dir, s) = store();
  fs::create_dir_all(s.records_dir()).unwrap();
  let legacy = s.legacy_records_path("Gastos");
  assert!(legacy.ends_with("registros/Gastos.json_datos.json"));
  fs::write(&legacy, r#"[{"Monto": 10}]"#).unwrap();

  assert_eq!(s.load_records("Gastos").unwrap().len(), 1);

  let record: Record = [("Monto", FieldValue::Number(15.0))].into_iter().collect();
  s.append_record("Gastos", &record).unwrap();
  let raw: serde_json::Value =
    serde_json::from_str(&fs::read_to_string(s.records_path("Gastos")).unwrap()).unwrap();
  assert_eq!(raw, json!([{"Monto": 10.0}, {"Monto": 15.0}]));
  assert_eq!(s.load_records("Gastos").unwrap().len(), 2);
}

#[test]
fn dates_and_times_are_stored_as_text() {
  let (_dir, s) = store();
  let record: Record = [
    ("Llegada", FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())),
    ("Estado", FieldValue::Choice("Nuevo".into())),
  ]
  .into_iter()
  .collect();
  s.append_record("Inventario", &record).unwrap();

  let raw: serde_json::Value =
    serde_json::from_str(&fs::read_to_string(s.records_path("Inventario")).unwrap()).unwrap();
  assert_eq!(raw, json!([{"Llegada": "2024-01-31", "Estado": "Nuevo"}]));
}

#[test]
fn malformed_records_are_corrupt() {
  let (_dir, s) = store();
  fs::create_dir_all(s.records_dir()).unwrap();
  fs::write(s.records_path("Gastos"), "[{\"Monto\": [1]}]").unwrap();
  assert!(s.load_records("Gastos").unwrap_err().is_corrupt());
  let record: Record = [("Monto", FieldValue::Number(1.0))].into_iter().collect();
  assert!(s.append_record("Gastos", &record).unwrap_err().is_corrupt());
}

#[test]
fn expense_scenario_end_to_end() {
  let (_dir, s) = store();
  let template = gastos();
  s.store_template(&template).unwrap();

  let engine = FormEngine::new(&s, true);
  let mut session = FormSession::new();
  for amount in ["10", "15"] {
    session.initialize_defaults(&template);
    session.capture(&template, 0, amount).unwrap();
    engine.submit(&mut session, &template).unwrap();
  }

  let raw: serde_json::Value =
    serde_json::from_str(&fs::read_to_string(s.records_path("Gastos")).unwrap()).unwrap();
  assert_eq!(raw, json!([{"Monto": 10.0}, {"Monto": 15.0}]));

  let records = s.load_records("Gastos").unwrap();
  let table = RecordTable::project(&records, template.key_field());
  assert_eq!(table.grand_total(), 25.0);
}

// ─── Import / export ─────────────────────────────────────────────────────────

#[test]
fn export_reserializes_stored_files() {
  let (_dir, s) = store();
  s.store_template(&gastos()).unwrap();
  let exported = s.export_template("Gastos").unwrap();
  assert_eq!(exported, fs::read_to_string(s.template_path("Gastos")).unwrap());

  assert!(s.export_records("Gastos").unwrap_err().is_not_found());
  assert!(s.export_template("Nada").unwrap_err().is_not_found());
}

#[test]
fn import_accepts_any_document() {
  let value = import_document(&b"{\"a\": [1, {\"b\": null}]}"[..], "upload").unwrap();
  assert_eq!(value, json!({"a": [1, {"b": null}]}));

  let err = import_document(&b"not json"[..], "upload").unwrap_err();
  assert!(matches!(err, Error::CorruptData { ref location, .. } if location == "upload"));
}
