// ── Typed device values ──
//
// A closed set of scalar kinds. Accessors are kind-checked and never
// coerce between kinds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ValueError;

/// A device's attributes for one reading, keyed by attribute name.
pub type Status = BTreeMap<String, Value>;

/// The kind tag of a [`Value`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Text,
}

/// One device attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_float(&self) -> Result<f64, ValueError> {
        match self {
            Self::Float(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_text(&self) -> Result<&str, ValueError> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Text)),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

// ── Construction ─────────────────────────────────────────────────────

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Build a [`Status`] from `(name, value)` pairs.
pub fn status<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Status
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ── Kind-checked extraction ──────────────────────────────────────────

/// Types that can be read back out of a [`Value`] of exactly one kind.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_float()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_int()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_bool()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_text().map(str::to_owned)
    }
}

/// Look up `name` in `status` and read it as `T`.
///
/// Fails with [`ValueError::MissingProperty`] if the attribute is absent and
/// [`ValueError::TypeMismatch`] if it holds a different kind.
pub fn get_property<T: FromValue>(status: &Status, name: &str) -> Result<T, ValueError> {
    let value = status.get(name).ok_or_else(|| ValueError::MissingProperty {
        name: name.to_owned(),
    })?;
    T::from_value(value)
}
