use chrono::{DateTime, FixedOffset, TimeZone};

use crate::trace::{SpanId, SpanKind, TraceId};

/// A property value attached to a [`LogEvent`](crate::event::LogEvent).
///
/// Values form a finite, acyclic tree. Formatters never mutate them.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    Sequence(Vec<PropertyValue>),
    Structure(Structure),
    Dictionary(Vec<(PropertyValue, PropertyValue)>),
}

/// Leaf values of the property tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    String(String),
    Timestamp(DateTime<FixedOffset>),
    TraceId(TraceId),
    SpanId(SpanId),
    SpanKind(SpanKind),
}

/// Ordered named fields with an optional type tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub type_tag: Option<String>,
    pub fields: Vec<(String, PropertyValue)>,
}

impl Structure {
    pub fn new(fields: Vec<(String, PropertyValue)>) -> Self {
        Structure {
            type_tag: None,
            fields,
        }
    }

    pub fn tagged(type_tag: impl Into<String>, fields: Vec<(String, PropertyValue)>) -> Self {
        Structure {
            type_tag: Some(type_tag.into()),
            fields,
        }
    }
}

impl PropertyValue {
    pub fn null() -> Self {
        PropertyValue::Scalar(Scalar::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<Structure> for PropertyValue {
    fn from(value: Structure) -> Self {
        PropertyValue::Structure(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(PropertyValue::null, Into::into)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::$variant(<$conv>::from(value)))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool as bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
    char => Char as char,
    String => String as String,
    &str => String as String,
    TraceId => TraceId as TraceId,
    SpanId => SpanId as SpanId,
    SpanKind => SpanKind as SpanKind,
}

impl<Tz: TimeZone> From<DateTime<Tz>> for PropertyValue {
    fn from(value: DateTime<Tz>) -> Self {
        PropertyValue::Scalar(Scalar::Timestamp(value.fixed_offset()))
    }
}

/// Generic JSON trees map onto the property model without type tags;
/// object field order follows the parsed document.
impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => PropertyValue::null(),
            Value::Bool(b) => b.into(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into()
                } else if let Some(u) = n.as_u64() {
                    u.into()
                } else {
                    n.as_f64().unwrap_or(f64::NAN).into()
                }
            }
            Value::String(s) => s.into(),
            Value::Array(items) => {
                PropertyValue::Sequence(items.into_iter().map(PropertyValue::from).collect())
            }
            Value::Object(map) => PropertyValue::Structure(Structure::new(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            )),
        }
    }
}
