//! Runtime values.
//!
//! A [`Value`] is either an immediate primitive, `Null`, or a reference into the [`Heap`](crate::Heap).
//! Values are `Copy`: copying a `Ref` copies the reference, never the object behind it. Object identity
//! is the [`HeapId`], which is what the deep-copy engine keys its visited map on.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::heap::HeapId;

/// The eight primitive kinds understood by the object model.
///
/// Primitive values are stored inline in [`Value`] and are always treated as immutable leaves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Returns the zero value of this kind: `false`, `0`, `0.0` or `'\0'`.
    #[must_use]
    pub fn zero(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Char => Value::Char('\0'),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
        }
    }
}

/// A runtime value.
///
/// `PartialEq` compares primitives by value and references by identity. Use [`Value::same`] when
/// `NaN` payloads must compare equal to themselves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// The absent reference.
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// A reference to a heap object.
    Ref(HeapId),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the referenced heap id, if this value is a reference.
    #[inline]
    #[must_use]
    pub fn ref_id(self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the primitive kind of an immediate value, or `None` for `Null` and references.
    #[must_use]
    pub fn primitive_kind(self) -> Option<PrimitiveKind> {
        match self {
            Self::Bool(_) => Some(PrimitiveKind::Boolean),
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            Self::Null | Self::Ref(_) => None,
        }
    }

    /// Identity comparison.
    ///
    /// References compare by heap id, floating point values by bit pattern, everything else by value.
    #[must_use]
    pub fn same(self, other: Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<HeapId> for Value {
    fn from(id: HeapId) -> Self {
        Self::Ref(id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Ref(id) => write!(f, "<ref #{}>", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn zero_values_match_their_kind() {
        for kind in PrimitiveKind::iter() {
            assert_eq!(kind.zero().primitive_kind(), Some(kind));
        }
        assert_eq!(PrimitiveKind::Char.zero(), Value::Char('\0'));
        assert_eq!(PrimitiveKind::Boolean.zero(), Value::Bool(false));
    }

    #[test]
    fn same_treats_nan_as_identical() {
        let nan = Value::Double(f64::NAN);
        assert!(nan != Value::Double(f64::NAN));
        assert!(nan.same(nan));
        assert!(!Value::Int(1).same(Value::Long(1)));
    }

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(PrimitiveKind::Double.to_string(), "double");
        let name: &'static str = PrimitiveKind::Boolean.into();
        assert_eq!(name, "boolean");
    }
}
