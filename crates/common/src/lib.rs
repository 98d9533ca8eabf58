//! Core value model and the trait surface shared by both node families.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod traits;

pub use error::{NodeError, ValueError};
pub use traits::{Node, NodeData, NodeDataExt};

/// Largest accepted byte length for string and blob payloads. Bounded by
/// `i32::MAX` so a payload always fits a single I/O call on 32-bit hosts.
pub const MAX_PAYLOAD_BYTES: usize = i32::MAX as usize;

/// A single stored datum: one of a closed set of scalar, string, and blob
/// alternatives.
///
/// String and blob payloads are reference-shared, so cloning a `Value` never
/// copies payload bytes; equality compares referent content. The set of
/// alternatives is frozen per on-disk format version: extending it requires
/// a version bump and a new codec branch, which the exhaustive matches below
/// enforce at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "ValueRepr")]
pub enum Value {
    Bool(bool),
    Char(i8),
    UChar(u8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(Arc<str>),
    Blob(Arc<[u8]>),
}

impl Value {
    /// Builds a string value, rejecting payloads over [`MAX_PAYLOAD_BYTES`].
    pub fn string(data: impl Into<Arc<str>>) -> Result<Self, ValueError> {
        let data = data.into();
        check_payload_len(data.len())?;
        Ok(Value::String(data))
    }

    /// Builds a blob value, rejecting payloads over [`MAX_PAYLOAD_BYTES`].
    pub fn blob(data: impl Into<Arc<[u8]>>) -> Result<Self, ValueError> {
        let data = data.into();
        check_payload_len(data.len())?;
        Ok(Value::Blob(data))
    }

    /// Extracts the payload when the active alternative matches `T`.
    pub fn try_as<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

fn check_payload_len(size: usize) -> Result<(), ValueError> {
    if size > MAX_PAYLOAD_BYTES {
        return Err(ValueError::TooLarge { size });
    }
    Ok(())
}

/// Conversion out of a [`Value`] payload, driving [`Value::try_as`] and the
/// typed reads of [`NodeDataExt`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! scalar_value {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(data: $ty) -> Self {
                    Value::$variant(data)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(data) => Some(*data),
                        _ => None,
                    }
                }
            }
        )*
    };
}

scalar_value! {
    Bool => bool,
    Char => i8,
    UChar => u8,
    UInt16 => u16,
    Int16 => i16,
    UInt32 => u32,
    Int32 => i32,
    UInt64 => u64,
    Int64 => i64,
    Float32 => f32,
    Float64 => f64,
}

impl FromValue for Arc<str> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(data) => Some(data.clone()),
            _ => None,
        }
    }
}

impl FromValue for Arc<[u8]> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(data) => Some(data.clone()),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(data) => Some(data.as_ref().to_owned()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(data) => Some(data.as_ref().to_vec()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(data) => write!(f, "{data}"),
            Value::Char(data) => write!(f, "{data}"),
            Value::UChar(data) => write!(f, "{data}"),
            Value::UInt16(data) => write!(f, "{data}"),
            Value::Int16(data) => write!(f, "{data}"),
            Value::UInt32(data) => write!(f, "{data}"),
            Value::Int32(data) => write!(f, "{data}"),
            Value::UInt64(data) => write!(f, "{data}"),
            Value::Int64(data) => write!(f, "{data}"),
            Value::Float32(data) => write!(f, "{data}"),
            Value::Float64(data) => write!(f, "{data}"),
            Value::String(data) => f.write_str(data),
            Value::Blob(data) => f.write_str(&hex::encode(data)),
        }
    }
}

/// Owned mirror of [`Value`] crossing serde boundaries, where payload sharing
/// is irrelevant.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ValueRepr {
    Bool(bool),
    Char(i8),
    UChar(u8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Blob(Vec<u8>),
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(data) => ValueRepr::Bool(data),
            Value::Char(data) => ValueRepr::Char(data),
            Value::UChar(data) => ValueRepr::UChar(data),
            Value::UInt16(data) => ValueRepr::UInt16(data),
            Value::Int16(data) => ValueRepr::Int16(data),
            Value::UInt32(data) => ValueRepr::UInt32(data),
            Value::Int32(data) => ValueRepr::Int32(data),
            Value::UInt64(data) => ValueRepr::UInt64(data),
            Value::Int64(data) => ValueRepr::Int64(data),
            Value::Float32(data) => ValueRepr::Float32(data),
            Value::Float64(data) => ValueRepr::Float64(data),
            Value::String(data) => ValueRepr::String(data.as_ref().to_owned()),
            Value::Blob(data) => ValueRepr::Blob(data.as_ref().to_vec()),
        }
    }
}

impl TryFrom<ValueRepr> for Value {
    type Error = ValueError;

    fn try_from(repr: ValueRepr) -> Result<Self, ValueError> {
        Ok(match repr {
            ValueRepr::Bool(data) => Value::Bool(data),
            ValueRepr::Char(data) => Value::Char(data),
            ValueRepr::UChar(data) => Value::UChar(data),
            ValueRepr::UInt16(data) => Value::UInt16(data),
            ValueRepr::Int16(data) => Value::Int16(data),
            ValueRepr::UInt32(data) => Value::UInt32(data),
            ValueRepr::Int32(data) => Value::Int32(data),
            ValueRepr::UInt64(data) => Value::UInt64(data),
            ValueRepr::Int64(data) => Value::Int64(data),
            ValueRepr::Float32(data) => Value::Float32(data),
            ValueRepr::Float64(data) => Value::Float64(data),
            ValueRepr::String(data) => Value::string(data)?,
            ValueRepr::Blob(data) => Value::blob(data)?,
        })
    }
}
