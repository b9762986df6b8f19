//! Tabular projection of stored records.
//!
//! Stored records of one template may have drifted apart as the template was
//! edited, so the table takes the union of their field names rather than the
//! current template's fields.

use crate::{record::Record, value::FieldValue};

/// One row of a [`RecordTable`]. `cells` lines up with
/// [`RecordTable::columns`]; an absent cell means the record had no value
/// for that column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub key:   Option<FieldValue>,
  pub cells: Vec<Option<FieldValue>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordTable {
  /// The column promoted to the row key, if any record has it.
  pub key_column: Option<String>,
  /// Remaining columns, in first-seen order.
  pub columns:    Vec<String>,
  pub rows:       Vec<Row>,
}

impl RecordTable {
  /// Build one row per record. Columns are the union of all field names in
  /// first-seen order; `key_field` becomes the row key when present.
  pub fn project(records: &[Record], key_field: Option<&str>) -> Self {
    let mut names: Vec<&str> = Vec::new();
    for name in records.iter().flat_map(Record::field_names) {
      if !names.contains(&name) {
        names.push(name);
      }
    }

    let key_column = key_field
      .filter(|k| names.contains(k))
      .map(str::to_owned);
    let columns: Vec<String> = names
      .into_iter()
      .filter(|n| Some(*n) != key_column.as_deref())
      .map(str::to_owned)
      .collect();

    let rows = records
      .iter()
      .map(|record| Row {
        key:   key_column.as_deref().and_then(|k| record.get(k)).cloned(),
        cells: columns.iter().map(|c| record.get(c).cloned()).collect(),
      })
      .collect();

    Self {
      key_column,
      columns,
      rows,
    }
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Sum of every numeric cell, the key column included. Unlike
  /// [`compute_total`](crate::form::compute_total) this ignores the
  /// template's total flags.
  pub fn grand_total(&self) -> f64 {
    self
      .rows
      .iter()
      .flat_map(|row| row.key.iter().chain(row.cells.iter().flatten()))
      .filter_map(FieldValue::as_number)
      .sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(cells: &[(&str, FieldValue)]) -> Record {
    cells.iter().map(|(n, v)| (*n, v.clone())).collect()
  }

  fn num(n: f64) -> FieldValue { FieldValue::Number(n) }

  fn text(s: &str) -> FieldValue { FieldValue::Text(s.into()) }

  #[test]
  fn empty_table_totals_zero() {
    let table = RecordTable::project(&[], Some("Monto"));
    assert!(table.is_empty());
    assert_eq!(table.key_column, None);
    assert_eq!(table.grand_total(), 0.0);
  }

  #[test]
  fn single_key_column_still_totals() {
    let records = [record(&[("Monto", num(10.0))]), record(&[("Monto", num(15.0))])];
    let table = RecordTable::project(&records, Some("Monto"));
    assert_eq!(table.key_column.as_deref(), Some("Monto"));
    assert!(table.columns.is_empty());
    assert_eq!(table.grand_total(), 25.0);
  }

  #[test]
  fn columns_are_the_union_in_first_seen_order() {
    let records = [
      record(&[("Concepto", text("pan")), ("Monto", num(2.0))]),
      record(&[("Concepto", text("leche")), ("Extra", num(1.5)), ("Monto", num(3.0))]),
      record(&[("Nota", text("sin concepto"))]),
    ];
    let table = RecordTable::project(&records, Some("Concepto"));
    assert_eq!(table.columns, ["Monto", "Extra", "Nota"]);
    assert_eq!(table.rows[0].key, Some(text("pan")));
    assert_eq!(table.rows[0].cells, vec![Some(num(2.0)), None, None]);
    assert_eq!(table.rows[2].key, None);
    assert_eq!(table.grand_total(), 6.5);
  }

  #[test]
  fn absent_key_field_is_not_promoted() {
    let records = [record(&[("Monto", num(1.0))])];
    let table = RecordTable::project(&records, Some("Fecha"));
    assert_eq!(table.key_column, None);
    assert_eq!(table.columns, ["Monto"]);
  }

  #[test]
  fn text_cells_are_not_summed() {
    let records = [record(&[("a", text("12")), ("b", num(4.0))])];
    assert_eq!(RecordTable::project(&records, None).grand_total(), 4.0);
  }
}
