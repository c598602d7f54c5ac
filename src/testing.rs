//! Fixtures for tests of conversion runs.
//!
//! Scratch files live in a [`tempfile::TempDir`] that is removed when dropped.
//!
//! ```no_run
//! use csvavro::testing::*;
//! use csvavro::{ConvertOptions, text_to_container};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = scratch_dir()?;
//! let input = write_text(dir.path(), "people.csv", "id,name\n1,Ada\n")?;
//! let output = dir.path().join("people.avro");
//! text_to_container(&[input], &output, &ConvertOptions::new())?;
//! let (schema, records) = read_container(&output)?;
//! assert_eq!(schema.fields.len(), 2);
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::io::container::ContainerReader;
use crate::record::Record;
use crate::schema::Schema;
use crate::types::{PrimitiveType, Value};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fresh temporary directory.
///
/// # Errors
/// Fails if the directory cannot be created.
pub fn scratch_dir() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}

/// Write `contents` to `dir/name` and return the path.
///
/// # Errors
/// Fails if the file cannot be written.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Decode a whole container with its embedded schema.
///
/// # Errors
/// Any error opening or decoding the container.
pub fn read_container(path: &Path) -> Result<(Schema, Vec<Record>)> {
    let reader = ContainerReader::open(path, None)?;
    let schema = Schema::from_avro(reader.embedded_schema())?;
    let records = reader
        .map(|value| Record::from_avro(value?, &schema.fields))
        .collect::<Result<Vec<_>>>()?;
    Ok((schema, records))
}

/// Avro JSON text for a record of the given `(name, type)` fields, without defaults.
#[must_use]
pub fn typed_schema_text(name: &str, fields: &[(&str, PrimitiveType)]) -> String {
    let fields: Vec<_> = fields
        .iter()
        .map(|(field, ty)| json!({ "name": field, "type": ty.name() }))
        .collect();
    json!({ "type": "record", "name": name, "fields": fields }).to_string()
}

/// Build a record from `(name, value)` pairs.
#[must_use]
pub fn record(entries: &[(&str, Value)]) -> Record {
    let mut builder = Record::builder(entries.len());
    for (name, value) in entries {
        builder.push(*name, value.clone());
    }
    builder.finish()
}

/// Shorthand for a string value.
#[must_use]
pub fn s(text: &str) -> Value {
    Value::String(text.to_owned())
}

/// Assert that two record lists are equal in order and content.
///
/// # Panics
///
/// Panics on the first differing record, or if the lengths differ.
pub fn assert_records_equal(actual: &[Record], expected: &[Record]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Record count mismatch:\n  Expected: {}\n  Actual: {}\n  Actual records: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Record mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}"
        );
    }
}
