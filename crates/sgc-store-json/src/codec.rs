//! Reading and writing the JSON files themselves.
//!
//! Files are UTF-8 JSON with four-space indentation. Writes go to a uniquely
//! named temporary file next to the target and are renamed into place, so a
//! crash mid-write leaves the previous version intact.

use std::{
  fs,
  io::{ErrorKind, Write},
  path::Path,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{Error, Result};

const INDENT: &[u8] = b"    ";

/// Serialise `value` as four-space-indented JSON.
pub fn to_pretty_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
  let mut out = Vec::new();
  let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
  value.serialize(&mut ser)?;
  Ok(out)
}

/// Read and decode the JSON file at `path`. A missing file yields `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
  let raw = match fs::read(path) {
    Ok(raw) => raw,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(Error::io(path, e)),
  };
  serde_json::from_slice(&raw)
    .map(Some)
    .map_err(|source| Error::CorruptData {
      location: path.display().to_string(),
      source,
    })
}

/// Replace the file at `path` with `value`, creating the parent directory
/// when needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  let bytes = to_pretty_bytes(value)?;
  let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
    Some(parent) => parent,
    None => Path::new("."),
  };
  fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

  let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
  tmp
    .write_all(&bytes)
    .and_then(|()| tmp.as_file().sync_all())
    .map_err(|e| Error::io(tmp.path(), e))?;
  // A failed persist drops the temp file, which removes it.
  tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
  Ok(())
}
