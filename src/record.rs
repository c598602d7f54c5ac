//! Records and the row coercion engine.
//!
//! A [`Record`] is assembled by a [`RecordBuilder`] and sealed before it is handed to a
//! writer; nothing holds on to it after that single write.

use crate::error::{ConversionError, ConvertError, Result};
use crate::schema::Field;
use crate::types::Value;
use apache_avro::types::Value as AvroValue;

/// Field values of one row, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub fn builder(capacity: usize) -> RecordBuilder {
        RecordBuilder {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract a decoded container record in `fields` order.
    ///
    /// Fields absent from the container value fall back to their default.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] if `value` is not a record, a field is missing without a
    /// default, or a value is not primitive.
    pub fn from_avro(value: AvroValue, fields: &[Field]) -> Result<Self> {
        let AvroValue::Record(mut decoded) = value else {
            return Err(ConvertError::Schema(
                "container entry is not a record".to_string(),
            ));
        };
        let mut builder = Self::builder(fields.len());
        for field in fields {
            let value = match decoded.iter().position(|(n, _)| *n == field.name) {
                Some(pos) => {
                    let (_, raw) = decoded.swap_remove(pos);
                    Value::from_avro(raw).ok_or_else(|| {
                        ConvertError::Schema(format!(
                            "field {:?} holds a non-primitive value",
                            field.name
                        ))
                    })?
                }
                None => default_value(field)?,
            };
            builder.push(field.name.clone(), value);
        }
        Ok(builder.finish())
    }
}

fn default_value(field: &Field) -> Result<Value> {
    field
        .default_value()
        .ok_or_else(|| {
            ConvertError::Schema(format!(
                "field {:?} is missing from the container record",
                field.name
            ))
        })?
        .map_err(|e| ConvertError::Schema(format!("default of field {:?}: {e}", field.name)))
}

impl From<Record> for AvroValue {
    fn from(record: Record) -> Self {
        AvroValue::Record(
            record
                .entries
                .into_iter()
                .map(|(name, value)| (name, value.into()))
                .collect(),
        )
    }
}

/// Incremental record assembly; [`RecordBuilder::finish`] seals it.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    entries: Vec<(String, Value)>,
}

impl RecordBuilder {
    pub fn push(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.entries.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn finish(self) -> Record {
        Record {
            entries: self.entries,
        }
    }
}

/// Coerce one text row against `fields`, left to right.
///
/// A cell that fails to coerce is replaced by the field's default, coerced the same
/// way. If there is no default, or the default fails too, the cell's own error is
/// returned, tagged with its column.
///
/// # Errors
/// [`ConversionError::ColumnCount`] when `row` and `fields` differ in length, otherwise
/// [`ConversionError::Field`] for the first cell that cannot be coerced.
pub fn coerce_row<S: AsRef<str>>(
    fields: &[Field],
    row: &[S],
) -> std::result::Result<Record, ConversionError> {
    if row.len() != fields.len() {
        return Err(ConversionError::ColumnCount {
            expected: fields.len(),
            found: row.len(),
        });
    }
    let mut builder = Record::builder(fields.len());
    for (index, (field, cell)) in fields.iter().zip(row).enumerate() {
        let value = match field.ty.coerce(cell.as_ref()) {
            Ok(value) => value,
            Err(error) => field
                .default_value()
                .and_then(std::result::Result::ok)
                .ok_or_else(|| ConversionError::Field {
                    index,
                    field: field.name.clone(),
                    error,
                })?,
        };
        builder.push(field.name.clone(), value);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;
    use serde_json::json;

    #[test]
    fn mistyped_default_reports_the_cell_error() {
        let fields = [Field::new("n", PrimitiveType::Int).with_default(json!("zero"))];
        let err = coerce_row(&fields, &["abc"]).unwrap_err();
        match err {
            ConversionError::Field { index, error, .. } => {
                assert_eq!(index, 0);
                assert_eq!(error.value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_avro_follows_field_order_not_container_order() {
        let fields = [
            Field::new("b", PrimitiveType::Long),
            Field::new("a", PrimitiveType::String),
        ];
        let value = AvroValue::Record(vec![
            ("a".into(), AvroValue::String("x".into())),
            ("b".into(), AvroValue::Long(7)),
        ]);
        let record = Record::from_avro(value, &fields).unwrap();
        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
