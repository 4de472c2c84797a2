#![cfg_attr(docsrs, doc(cfg(feature = "serde")))]

//! Serde serialization support for the value tree.
//!
//! Enabled by the `serde` feature flag. Tables serialize as maps, arrays as
//! sequences, and the four date/time kinds as their display strings. There
//! is no `Deserialize` counterpart; the tree is produced by parsing only.

use crate::{Array, Table, Value};

impl serde::Serialize for Value {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::String(v) => ser.serialize_str(v),
            Value::Integer(v) => ser.serialize_i64(*v),
            Value::Float(v) => ser.serialize_f64(*v),
            Value::Boolean(v) => ser.serialize_bool(*v),
            Value::OffsetDateTime(v) => ser.collect_str(v),
            Value::LocalDateTime(v) => ser.collect_str(v),
            Value::LocalDate(v) => ser.collect_str(v),
            Value::LocalTime(v) => ser.collect_str(v),
            Value::Array(v) => v.serialize(ser),
            Value::Table(v) => v.serialize(ser),
        }
    }
}

impl serde::Serialize for Array {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = ser.serialize_seq(Some(self.len()))?;
        for value in self {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl serde::Serialize for Table {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = ser.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
