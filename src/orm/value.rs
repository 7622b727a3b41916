//! Scalar values and the field access protocol between entities and the core.

use super::error::{OrmError, Result};
use super::meta::{downcast, Entity};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// Text layout of stored DATETIME columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single scalar as seen by the statement compiler and the row mapper.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Boolean(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a borrowed SQLite cell into an owned value.
    pub fn from_sql_ref(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(value) => Ok(Value::Integer(value)),
            ValueRef::Real(value) => Ok(Value::Real(value)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|text| Value::Text(text.to_string()))
                .map_err(|_| OrmError::unexpected("UTF-8 text", String::from_utf8_lossy(bytes))),
            ValueRef::Blob(_) => Err(OrmError::unexpected("text or number", "blob")),
        }
    }

    /// Parses a stored DATETIME cell, either text or unix epoch seconds.
    pub fn parse_datetime(&self) -> Result<NaiveDateTime> {
        match self {
            Value::DateTime(value) => Ok(*value),
            Value::Text(text) => NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|source| OrmError::DateTimeParse {
                value: text.clone(),
                source,
            }),
            Value::Integer(epoch) => DateTime::from_timestamp(*epoch, 0)
                .map(|value| value.naive_utc())
                .ok_or_else(|| OrmError::unexpected("epoch seconds in range", epoch)),
            other => Err(OrmError::unexpected("datetime", other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "'{}'", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::DateTime(value) => write!(f, "'{}'", value.format(DATETIME_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Null => Ok(ToSqlOutput::Borrowed(ValueRef::Null)),
            Value::Integer(value) => Ok(ToSqlOutput::Borrowed(ValueRef::Integer(*value))),
            Value::Real(value) => Ok(ToSqlOutput::Borrowed(ValueRef::Real(*value))),
            Value::Text(value) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes()))),
            Value::Boolean(value) => Ok(ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*value)))),
            Value::DateTime(value) => Ok(ToSqlOutput::from(value.format(DATETIME_FORMAT).to_string())),
        }
    }
}

/// Read access to one field of an entity.
#[derive(Debug)]
pub enum FieldRef<'a> {
    Scalar(Value),
    One(Option<&'a dyn Entity>),
    Many(Vec<&'a dyn Entity>),
}

/// Owned value written into one field of an entity.
#[derive(Debug)]
pub enum FieldValue {
    Scalar(Value),
    One(Option<Box<dyn Entity>>),
    Many(Vec<Box<dyn Entity>>),
}

/// Conversion between a struct field and the core's field protocol.
pub trait Persist: Sized {
    fn to_field(&self) -> FieldRef<'_>;
    fn from_field(value: FieldValue) -> Result<Self>;
}

fn scalar(value: FieldValue) -> Result<Value> {
    match value {
        FieldValue::Scalar(value) => Ok(value),
        other => Err(OrmError::unexpected("scalar", other)),
    }
}

impl Persist for i64 {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Value::Integer(*self))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        let value = scalar(value)?;
        value.as_integer().ok_or_else(|| OrmError::unexpected("integer", value))
    }
}

impl Persist for i32 {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Value::Integer(i64::from(*self)))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        let wide = i64::from_field(value)?;
        i32::try_from(wide).map_err(|_| OrmError::unexpected("32-bit integer", wide))
    }
}

impl Persist for String {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Value::Text(self.clone()))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        match scalar(value)? {
            Value::Text(text) => Ok(text),
            Value::Integer(number) => Ok(number.to_string()),
            Value::Real(number) => Ok(number.to_string()),
            other => Err(OrmError::unexpected("text", other)),
        }
    }
}

impl Persist for bool {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Value::Boolean(*self))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        match scalar(value)? {
            Value::Boolean(flag) => Ok(flag),
            Value::Integer(number) => Ok(number != 0),
            other => Err(OrmError::unexpected("boolean", other)),
        }
    }
}

impl Persist for NaiveDateTime {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Value::DateTime(*self))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        scalar(value)?.parse_datetime()
    }
}

macro_rules! persist_optional {
    ($($ty:ty),+) => {
        $(
            impl Persist for Option<$ty> {
                fn to_field(&self) -> FieldRef<'_> {
                    match self {
                        Some(value) => value.to_field(),
                        None => FieldRef::Scalar(Value::Null),
                    }
                }

                fn from_field(value: FieldValue) -> Result<Self> {
                    match value {
                        FieldValue::Scalar(Value::Null) => Ok(None),
                        other => <$ty>::from_field(other).map(Some),
                    }
                }
            }
        )+
    };
}

persist_optional!(i64, i32, String, bool, NaiveDateTime);

impl<T: Entity + Clone> Persist for Option<Box<T>> {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::One(self.as_deref().map(|related| related as &dyn Entity))
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::One(Some(related)) => downcast::<T>(related).map(Some),
            FieldValue::One(None) | FieldValue::Scalar(Value::Null) => Ok(None),
            other => Err(OrmError::unexpected("related instance", other)),
        }
    }
}

impl<T: Entity + Clone> Persist for Vec<T> {
    fn to_field(&self) -> FieldRef<'_> {
        FieldRef::Many(self.iter().map(|element| element as &dyn Entity).collect())
    }

    fn from_field(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Many(elements) => elements.into_iter().map(|element| downcast::<T>(element).map(|boxed| *boxed)).collect(),
            FieldValue::Scalar(Value::Null) => Ok(Vec::new()),
            other => Err(OrmError::unexpected("related collection", other)),
        }
    }
}
