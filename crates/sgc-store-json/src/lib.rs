//! JSON file backend for SGC templates and records.
//!
//! Each template is one pretty-printed JSON file named after the template in
//! the template directory. Records of a template live in a separate records
//! directory as one JSON array per template. Every write replaces the whole
//! file through a temporary file and a rename.

mod codec;
mod exchange;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use exchange::{import_document, import_file, to_pretty_string};
pub use store::{JsonStore, TemplateKeys};

#[cfg(test)]
mod tests;
