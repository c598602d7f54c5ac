//! Record schemas: parsing, inference and compatibility.
//!
//! A [`Schema`] is resolved once per run, either from an explicit Avro JSON schema or by
//! inferring one `string` field per header column, and is read-only afterwards. Only flat
//! records of primitive fields are accepted.

use crate::dialect::{Dialect, parse_rows};
use crate::error::{CoerceError, ConvertError, Result};
use crate::types::{PrimitiveType, Value};
use apache_avro::Schema as AvroSchema;
use apache_avro::schema::SchemaKind;
use serde_json::json;
use std::borrow::Cow;
use std::collections::HashSet;

/// One named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: PrimitiveType,
    /// Avro JSON default. `None` means no default; `Some(Null)` is a present null default.
    pub default: Option<serde_json::Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The default rendered as a text cell, ready to go through the coercion table.
    #[must_use]
    pub fn default_text(&self) -> Option<Cow<'_, str>> {
        self.default.as_ref().map(|d| match d {
            serde_json::Value::String(s) => Cow::Borrowed(s.as_str()),
            serde_json::Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        })
    }

    /// The default as a typed value, or `None` when the field has no default.
    ///
    /// A `bytes` default given as a JSON string maps each code point to one byte
    /// (ISO-8859-1), as Avro prescribes; other defaults go through [`PrimitiveType::coerce`].
    pub fn default_value(&self) -> Option<Result<Value, CoerceError>> {
        let default = self.default.as_ref()?;
        if let (PrimitiveType::Bytes, serde_json::Value::String(text)) = (self.ty, default) {
            return Some(latin1_bytes(text));
        }
        self.default_text().map(|text| self.ty.coerce(&text))
    }
}

fn latin1_bytes(text: &str) -> Result<Value, CoerceError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map(Value::Bytes)
        .map_err(|_| {
            CoerceError::new(
                PrimitiveType::Bytes,
                text,
                "bytes default has a code point above U+00FF",
            )
        })
}

/// Ordered field list plus the record name.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub namespace: Option<String>,
    pub fields: Vec<Field>,
}

impl Schema {
    /// Build a schema, checking the record name, that it has fields and that their names
    /// are unique.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] when the record name is not a valid Avro name, `fields` is
    /// empty or a field name repeats.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;
        if fields.is_empty() {
            return Err(ConvertError::Schema(format!("record {name} has no fields")));
        }
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConvertError::Schema(format!(
                    "duplicate field name {:?} in record {name}",
                    field.name
                )));
            }
        }
        Ok(Self {
            name,
            namespace: None,
            fields,
        })
    }

    /// Parse Avro JSON schema text.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] if the text does not parse or is not a flat record of
    /// primitive fields.
    pub fn parse(text: &str) -> Result<Self> {
        check_declared_names(text)?;
        let avro = AvroSchema::parse_str(text)
            .map_err(|e| ConvertError::Schema(format!("cannot parse schema: {e}")))?;
        Self::from_avro(&avro)
    }

    /// All-`string` schema with one field per header token, none with a default.
    ///
    /// # Errors
    /// See [`Schema::new`].
    pub fn infer<I, S>(name: impl Into<String>, header: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = header
            .into_iter()
            .map(|column| Field::new(column, PrimitiveType::String))
            .collect();
        Self::new(name, fields)
    }

    /// Narrow an Avro schema to this crate's data model.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] for non-record schemas, empty records and any field whose
    /// type is not primitive.
    pub fn from_avro(schema: &AvroSchema) -> Result<Self> {
        let AvroSchema::Record(record) = schema else {
            return Err(ConvertError::Schema(format!(
                "top-level schema must be a record, found {:?}",
                SchemaKind::from(schema)
            )));
        };
        let fields = record
            .fields
            .iter()
            .map(|f| {
                let ty = primitive_of(&f.schema).ok_or_else(|| {
                    ConvertError::Schema(format!(
                        "field {:?} has unsupported type {:?}; only primitive types are allowed",
                        f.name,
                        SchemaKind::from(&f.schema)
                    ))
                })?;
                Ok(Field {
                    name: f.name.clone(),
                    ty,
                    default: f.default.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut out = Self::new(record.name.name.clone(), fields)?;
        out.namespace = record.name.namespace.clone();
        Ok(out)
    }

    /// The equivalent Avro schema, for writers and projected readers.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] when names are not valid Avro names or a default does not
    /// fit its field type.
    pub fn to_avro(&self) -> Result<AvroSchema> {
        check_name(&self.name)?;
        if let Some(ns) = &self.namespace {
            check_namespace(ns)?;
        }
        let fields: Vec<serde_json::Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut field = json!({ "name": f.name, "type": f.ty.name() });
                if let Some(default) = &f.default {
                    field["default"] = default.clone();
                }
                field
            })
            .collect();
        let mut root = json!({ "type": "record", "name": self.name, "fields": fields });
        if let Some(ns) = &self.namespace {
            root["namespace"] = json!(ns);
        }
        AvroSchema::parse(&root).map_err(|e| {
            ConvertError::Schema(format!("record {} is not a valid Avro schema: {e}", self.name))
        })
    }

    /// Rename the record.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] when `name` is not a valid Avro name.
    pub fn with_name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;
        self.name = name;
        Ok(self)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Require identical field names and types, in order.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] naming the first difference.
    pub fn ensure_same_shape(&self, other: &Schema) -> Result<()> {
        if self.fields.len() != other.fields.len() {
            return Err(ConvertError::Schema(format!(
                "schema has {} fields but the container has {}",
                self.fields.len(),
                other.fields.len()
            )));
        }
        for (mine, theirs) in self.fields.iter().zip(&other.fields) {
            if mine.name != theirs.name || mine.ty != theirs.ty {
                return Err(ConvertError::Schema(format!(
                    "field {}:{} does not match container field {}:{}",
                    mine.name, mine.ty, theirs.name, theirs.ty
                )));
            }
        }
        Ok(())
    }

    /// Check that records written with `writer` can be read as `self`.
    ///
    /// Each field must exist in `writer` with a promotable type, or carry a default.
    ///
    /// # Errors
    /// [`ConvertError::Schema`] naming the incompatible field.
    pub fn check_readable_from(&self, writer: &Schema) -> Result<()> {
        for field in &self.fields {
            match writer.field(&field.name) {
                Some(w) if w.ty.promotes_to(field.ty) => {}
                Some(w) => {
                    return Err(ConvertError::Schema(format!(
                        "field {:?} is {} in the container and cannot be read as {}",
                        field.name, w.ty, field.ty
                    )));
                }
                None if field.default.is_some() => {}
                None => {
                    return Err(ConvertError::Schema(format!(
                        "field {:?} is missing from container record {} and has no default",
                        field.name, writer.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// A record name may be a dotted full name; every segment must be an identifier.
fn check_name(name: &str) -> Result<()> {
    if name.split('.').all(is_identifier) {
        Ok(())
    } else {
        Err(ConvertError::Schema(format!(
            "{name:?} is not a valid record name; use letters, digits and underscores, not starting with a digit"
        )))
    }
}

fn check_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || namespace.split('.').all(is_identifier) {
        Ok(())
    } else {
        Err(ConvertError::Schema(format!(
            "{namespace:?} is not a valid namespace"
        )))
    }
}

// apache-avro panics on malformed names of named types, so they are checked on the raw
// JSON first. Text that is not JSON is left for the Avro parser to reject.
fn check_declared_names(text: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(root) => check_named_types(&root),
        Err(_) => Ok(()),
    }
}

fn check_named_types(value: &serde_json::Value) -> Result<()> {
    use serde_json::Value as Json;
    match value {
        Json::Object(map) => {
            let named = matches!(
                map.get("type"),
                Some(Json::String(t)) if matches!(t.as_str(), "record" | "enum" | "fixed")
            );
            if named {
                if let Some(Json::String(name)) = map.get("name") {
                    check_name(name)?;
                }
                if let Some(Json::String(ns)) = map.get("namespace") {
                    check_namespace(ns)?;
                }
            }
            for key in ["type", "fields", "items", "values"] {
                if let Some(inner) = map.get(key) {
                    check_named_types(inner)?;
                }
            }
            Ok(())
        }
        Json::Array(items) => items.iter().try_for_each(check_named_types),
        _ => Ok(()),
    }
}

fn primitive_of(schema: &AvroSchema) -> Option<PrimitiveType> {
    Some(match schema {
        AvroSchema::Null => PrimitiveType::Null,
        AvroSchema::Boolean => PrimitiveType::Boolean,
        AvroSchema::Int => PrimitiveType::Int,
        AvroSchema::Long => PrimitiveType::Long,
        AvroSchema::Float => PrimitiveType::Float,
        AvroSchema::Double => PrimitiveType::Double,
        AvroSchema::Bytes => PrimitiveType::Bytes,
        AvroSchema::String => PrimitiveType::String,
        _ => return None,
    })
}

/// Resolve the schema for a text-to-container run.
///
/// With `explicit` schema text, that text wins. Otherwise the first row of `sample` must
/// be a header (per `dialect`) and each of its cells becomes a `string` field; the record
/// is named `record_name`.
///
/// # Errors
/// [`ConvertError::Schema`] if the explicit schema is invalid, or if inference is needed
/// and there is no header row.
pub fn resolve(
    explicit: Option<&str>,
    sample: &str,
    dialect: Dialect,
    record_name: &str,
) -> Result<Schema> {
    if let Some(text) = explicit {
        return Schema::parse(text);
    }
    if !dialect.has_header {
        return Err(ConvertError::Schema(
            "no schema given and the input has no header row to infer one from".into(),
        ));
    }
    let header = parse_rows(sample, dialect.delimiter, 1)
        .into_iter()
        .next()
        .ok_or_else(|| ConvertError::Schema("input is empty; cannot infer a schema".into()))?;
    Schema::infer(record_name, header.iter())
}

/// Turn an arbitrary identifier (usually a file stem) into a valid Avro name.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return "record".into();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
