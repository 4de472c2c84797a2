//! The [`Value`] enum: an owned TOML value of one of the eight TOML types.

#[cfg(test)]
#[path = "./value_tests.rs"]
mod tests;

use crate::time::{Date, LocalDateTime, OffsetDateTime, Temporal, Time};
use std::fmt;

/// A TOML array.
pub use crate::array::Array;
/// A TOML table: key-value pairs in insertion order.
pub use crate::table::Table;

/// A parsed TOML value.
///
/// The tree is fully owned; it holds no references to the parsed source.
/// Date/time values come in the four TOML kinds. Floats are [`f64`] unless
/// the caller substitutes another representation through a
/// [`ParseFloat`](crate::ParseFloat) hook.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// A string.
    String(String),
    /// An integer.
    Integer(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// A date-time with a UTC offset.
    OffsetDateTime(OffsetDateTime),
    /// A date-time without an offset.
    LocalDateTime(LocalDateTime),
    /// A date without a time.
    LocalDate(Date),
    /// A time without a date.
    LocalTime(Time),
    /// An array.
    Array(Array),
    /// A table.
    Table(Table),
}

impl Value {
    /// Gets the type of the value as a string.
    pub fn type_str(&self) -> &'static str {
        match self {
            Value::String(..) => "string",
            Value::Integer(..) => "integer",
            Value::Float(..) => "float",
            Value::Boolean(..) => "boolean",
            Value::OffsetDateTime(..) => "offset date-time",
            Value::LocalDateTime(..) => "local date-time",
            Value::LocalDate(..) => "local date",
            Value::LocalTime(..) => "local time",
            Value::Array(..) => "array",
            Value::Table(..) => "table",
        }
    }

    /// Returns a borrowed string if this is a string value.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns an `i64` if this is an integer value.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns an `f64` if this is a float value.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a `bool` if this is a boolean value.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a borrowed array if this is an array value.
    #[inline]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns a borrowed table if this is a table value.
    #[inline]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a mutable array reference.
    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns a mutable table reference.
    #[inline]
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Seals a literal value: marks this table or array and everything
    /// beneath it immutable to subsequent document lines.
    pub(crate) fn freeze(&mut self) {
        match self {
            Value::Table(table) => {
                table.set_frozen();
                for value in table.values_mut() {
                    value.freeze();
                }
            }
            Value::Array(array) => {
                array.set_frozen();
                for value in array.values_mut() {
                    value.freeze();
                }
            }
            _ => {}
        }
    }
}

impl From<Temporal> for Value {
    fn from(temporal: Temporal) -> Self {
        match temporal {
            Temporal::OffsetDateTime(v) => Value::OffsetDateTime(v),
            Temporal::LocalDateTime(v) => Value::LocalDateTime(v),
            Temporal::LocalDate(v) => Value::LocalDate(v),
            Temporal::LocalTime(v) => Value::LocalTime(v),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => v.fmt(f),
            Value::Integer(v) => v.fmt(f),
            Value::Float(v) => v.fmt(f),
            Value::Boolean(v) => v.fmt(f),
            Value::OffsetDateTime(v) => v.fmt(f),
            Value::LocalDateTime(v) => v.fmt(f),
            Value::LocalDate(v) => v.fmt(f),
            Value::LocalTime(v) => v.fmt(f),
            Value::Array(v) => v.fmt(f),
            Value::Table(v) => v.fmt(f),
        }
    }
}
