//! Core types and trait definitions for SGC, the schema-driven data-entry
//! system.
//!
//! A template is a named, ordered schema of typed fields. Records are filled
//! in against a template by the [`form::FormEngine`] and reviewed through the
//! [`table::RecordTable`] projection. This crate has no
//! filesystem or terminal dependencies; storage backends implement the
//! traits in [`store`].

pub mod error;
pub mod field;
pub mod form;
pub mod record;
pub mod store;
pub mod table;
pub mod template;
pub mod value;

pub use error::{Error, Result, StaleChoiceWarning};
