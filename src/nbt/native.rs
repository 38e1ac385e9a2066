//! Conversion between NBT trees and `serde_json::Value`.
//!
//! JSON numbers do not say how wide they are and an empty JSON array does not
//! say what it would hold, so [`from_native`] takes an optional [`Schema`] to
//! settle those cases. Without one, integers become `Int` when they fit in 32
//! bits and `Long` otherwise, and fractional numbers become `Double`.

use serde_json::{Map, Number, Value};

use crate::core::primitives::{narrow, Integral};
use crate::error::{ProtocolError, Result};
use crate::nbt::tag::{relabel_range, Compound, List, Tag, TagKind};

/// Expected shape of a native value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List(Box<Schema>),
    /// Fields without an entry are inferred. Fields absent from the data are
    /// not an error.
    Compound(Vec<(String, Schema)>),
    IntArray,
    LongArray,
}

impl Schema {
    pub fn kind(&self) -> TagKind {
        match self {
            Schema::Byte => TagKind::Byte,
            Schema::Short => TagKind::Short,
            Schema::Int => TagKind::Int,
            Schema::Long => TagKind::Long,
            Schema::Float => TagKind::Float,
            Schema::Double => TagKind::Double,
            Schema::ByteArray => TagKind::ByteArray,
            Schema::String => TagKind::String,
            Schema::List(_) => TagKind::List,
            Schema::Compound(_) => TagKind::Compound,
            Schema::IntArray => TagKind::IntArray,
            Schema::LongArray => TagKind::LongArray,
        }
    }

    /// Schema that reproduces `tag` from its [`to_native`] form.
    ///
    /// The schemas of all list elements are merged, so compounds in one list
    /// may carry different fields. A field whose type differs between two
    /// elements keeps the type it has in the earlier element, and such a tree
    /// does not come back unchanged. Returns `None` for `End` and for lists
    /// with no element that yields a schema and no declared element kind.
    pub fn of(tag: &Tag) -> Option<Self> {
        Some(match tag {
            Tag::End => return None,
            Tag::Byte(_) => Schema::Byte,
            Tag::Short(_) => Schema::Short,
            Tag::Int(_) => Schema::Int,
            Tag::Long(_) => Schema::Long,
            Tag::Float(_) => Schema::Float,
            Tag::Double(_) => Schema::Double,
            Tag::ByteArray(_) => Schema::ByteArray,
            Tag::String(_) => Schema::String,
            Tag::List(list) => {
                let merged = list
                    .iter()
                    .filter_map(Self::of)
                    .reduce(|merged, next| merged.merge(next));
                Schema::List(Box::new(match merged {
                    Some(element) => element,
                    None => Self::empty_of(list.kind())?,
                }))
            }
            Tag::Compound(compound) => Schema::Compound(
                compound
                    .iter()
                    .filter_map(|(name, child)| Self::of(child).map(|s| (name.to_string(), s)))
                    .collect(),
            ),
            Tag::IntArray(_) => Schema::IntArray,
            Tag::LongArray(_) => Schema::LongArray,
        })
    }

    /// Combine two schemas for values of the same list.
    ///
    /// Compound fields are unioned in first-seen order and list element
    /// schemas merge recursively; otherwise `self` wins.
    pub fn merge(self, other: Schema) -> Schema {
        match (self, other) {
            (Schema::Compound(mut fields), Schema::Compound(more)) => {
                for (name, schema) in more {
                    match fields.iter().position(|(existing, _)| *existing == name) {
                        Some(i) => fields[i].1 = fields[i].1.clone().merge(schema),
                        None => fields.push((name, schema)),
                    }
                }
                Schema::Compound(fields)
            }
            (Schema::List(element), Schema::List(more)) => {
                Schema::List(Box::new((*element).merge(*more)))
            }
            (first, _) => first,
        }
    }

    fn empty_of(kind: TagKind) -> Option<Self> {
        Some(match kind {
            TagKind::End => return None,
            TagKind::Byte => Schema::Byte,
            TagKind::Short => Schema::Short,
            TagKind::Int => Schema::Int,
            TagKind::Long => Schema::Long,
            TagKind::Float => Schema::Float,
            TagKind::Double => Schema::Double,
            TagKind::ByteArray => Schema::ByteArray,
            TagKind::String => Schema::String,
            TagKind::List => return None,
            TagKind::Compound => Schema::Compound(Vec::new()),
            TagKind::IntArray => Schema::IntArray,
            TagKind::LongArray => Schema::LongArray,
        })
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &Schema, found: &Value) -> ProtocolError {
    ProtocolError::mismatch(expected.kind().name(), describe(found))
}

/// Read a JSON integer, widened to `i128` so out-of-range `u64` values still
/// produce a range error rather than a mismatch.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Bool(b) => Some(i128::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        _ => None,
    }
}

fn integer_array(schema: &Schema, value: &Value) -> Result<Vec<i128>> {
    let Value::Array(items) = value else {
        return Err(mismatch(schema, value));
    };
    items
        .iter()
        .map(|item| integer(item).ok_or_else(|| mismatch(schema, item)))
        .collect()
}

fn narrow_each<T: Integral>(kind: TagKind, values: Vec<i128>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| narrow::<T>(v).map_err(|e| relabel_range(e, kind)))
        .collect()
}

/// Build a tag from a native value.
///
/// # Errors
/// - `ProtocolError::SchemaMismatch` when the value's shape disagrees with
///   `schema`, or for `null`
/// - `ProtocolError::Range` when a number does not fit the schema's width
/// - `ProtocolError::Structural` for empty object keys or mixed arrays
pub fn from_native(value: &Value, schema: Option<&Schema>) -> Result<Tag> {
    match schema {
        Some(schema) => with_schema(value, schema),
        None => infer(value),
    }
}

fn with_schema(value: &Value, schema: &Schema) -> Result<Tag> {
    match schema {
        Schema::Byte | Schema::Short | Schema::Int | Schema::Long => {
            let v = integer(value).ok_or_else(|| mismatch(schema, value))?;
            Tag::integer(schema.kind(), v)
        }
        Schema::Float => {
            let v = value.as_f64().ok_or_else(|| mismatch(schema, value))?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(ProtocolError::Range {
                    kind: TagKind::Float.name(),
                    value: v.to_string(),
                    min: f32::MIN.to_string(),
                    max: f32::MAX.to_string(),
                });
            }
            Ok(Tag::Float(v as f32))
        }
        Schema::Double => value
            .as_f64()
            .map(Tag::Double)
            .ok_or_else(|| mismatch(schema, value)),
        Schema::String => value
            .as_str()
            .map(Tag::from)
            .ok_or_else(|| mismatch(schema, value)),
        Schema::ByteArray => Ok(Tag::ByteArray(narrow_each(
            TagKind::ByteArray,
            integer_array(schema, value)?,
        )?)),
        Schema::IntArray => Ok(Tag::IntArray(narrow_each(
            TagKind::IntArray,
            integer_array(schema, value)?,
        )?)),
        Schema::LongArray => Ok(Tag::LongArray(narrow_each(
            TagKind::LongArray,
            integer_array(schema, value)?,
        )?)),
        Schema::List(element) => {
            let Value::Array(items) = value else {
                return Err(mismatch(schema, value));
            };
            let mut list = List::of(element.kind());
            for item in items {
                list.push(with_schema(item, element)?)?;
            }
            Ok(Tag::List(list))
        }
        Schema::Compound(fields) => {
            let Value::Object(map) = value else {
                return Err(mismatch(schema, value));
            };
            let mut compound = Compound::new();
            for (name, child) in map {
                let field = fields.iter().find(|(n, _)| n == name).map(|(_, s)| s);
                compound.insert(name.as_str(), from_native(child, field)?)?;
            }
            Ok(Tag::Compound(compound))
        }
    }
}

/// Numeric rank used to widen array elements: Int < Long < Double.
fn numeric_schema(value: &Value) -> Option<Schema> {
    let Value::Number(n) = value else {
        return None;
    };
    Some(match n.as_i64() {
        Some(v) if i32::try_from(v).is_ok() => Schema::Int,
        Some(_) => Schema::Long,
        None if n.is_u64() => Schema::Long,
        None => Schema::Double,
    })
}

fn widen(a: Schema, b: Schema) -> Schema {
    match (a, b) {
        (Schema::Double, _) | (_, Schema::Double) => Schema::Double,
        (Schema::Long, _) | (_, Schema::Long) => Schema::Long,
        _ => Schema::Int,
    }
}

fn infer(value: &Value) -> Result<Tag> {
    match value {
        Value::Null => Err(ProtocolError::mismatch("a value", "null")),
        Value::Bool(b) => Ok(Tag::from(*b)),
        Value::Number(_) => {
            let schema = numeric_schema(value).unwrap_or(Schema::Double);
            with_schema(value, &schema)
        }
        Value::String(s) => Ok(Tag::String(s.clone())),
        Value::Array(items) => {
            // all-numeric arrays share the widest element kind
            let widest = items.iter().try_fold(None::<Schema>, |acc, item| {
                let schema = numeric_schema(item)?;
                Some(Some(match acc {
                    Some(prev) => widen(prev, schema),
                    None => schema,
                }))
            });
            match widest.flatten() {
                Some(schema) => with_schema(value, &Schema::List(Box::new(schema))),
                None => Ok(Tag::List(List::from_tags(
                    items.iter().map(infer).collect::<Result<Vec<_>>>()?,
                )?)),
            }
        }
        Value::Object(map) => {
            let mut compound = Compound::new();
            for (name, child) in map {
                compound.insert(name.as_str(), infer(child)?)?;
            }
            Ok(Tag::Compound(compound))
        }
    }
}

/// Convert a tag to its native form.
///
/// Integers become JSON integers, arrays and lists JSON arrays, compounds JSON
/// objects. Non-finite floats and `End` become `null`.
pub fn to_native(tag: &Tag) -> Value {
    fn float(v: f64) -> Value {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }

    match tag {
        Tag::End => Value::Null,
        Tag::Byte(v) => Value::from(*v),
        Tag::Short(v) => Value::from(*v),
        Tag::Int(v) => Value::from(*v),
        Tag::Long(v) => Value::from(*v),
        Tag::Float(v) => float(f64::from(*v)),
        Tag::Double(v) => float(*v),
        Tag::ByteArray(values) => values.iter().map(|v| Value::from(*v)).collect(),
        Tag::String(s) => Value::String(s.clone()),
        Tag::List(list) => list.iter().map(to_native).collect(),
        Tag::Compound(compound) => Value::Object(
            compound
                .iter()
                .map(|(name, child)| (name.to_string(), to_native(child)))
                .collect::<Map<String, Value>>(),
        ),
        Tag::IntArray(values) => values.iter().map(|v| Value::from(*v)).collect(),
        Tag::LongArray(values) => values.iter().map(|v| Value::from(*v)).collect(),
    }
}
