//! Typed property values

use std::fmt;

const EMPTY_LIST: &str = "EmptyList";
const EMPTY_MAP: &str = "EmptyMap";

/// A raw value held by a property source
///
/// Values keep the type they were declared with so that reports can show
/// `8080 (Integer)` without inspecting anything at runtime.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// Key is present but carries no value (e.g. `key: ~` in YAML)
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Any value without a dedicated variant, such as a TOML datetime
    Other { type_label: String, display: String },
}

impl PropertyValue {
    /// Create an `Other` value with the given type label
    pub fn other(type_label: impl Into<String>, display: impl Into<String>) -> Self {
        Self::Other {
            type_label: type_label.into(),
            display: display.into(),
        }
    }

    /// Marker for a list declared without items, e.g. `paths: []`
    pub fn empty_list() -> Self {
        Self::other(EMPTY_LIST, "[]")
    }

    /// Marker for a table or mapping declared without entries
    pub fn empty_map() -> Self {
        Self::other(EMPTY_MAP, "{}")
    }

    /// Whether this is the marker for an empty list or map
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Self::Other { type_label, .. } => type_label == EMPTY_LIST || type_label == EMPTY_MAP,
            _ => false,
        }
    }

    /// Label used when the value is rendered with its type
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Text(_) => "String",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Boolean(_) => "Boolean",
            Self::Other { type_label, .. } => type_label,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text if this is a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into the `config` crate's value kind for weakly typed binding
    pub(crate) fn into_value_kind(self) -> config::ValueKind {
        match self {
            Self::Null => config::ValueKind::Nil,
            Self::Text(s) => config::ValueKind::String(s),
            Self::Integer(i) => config::ValueKind::I64(i),
            Self::Float(f) => config::ValueKind::Float(f),
            Self::Boolean(b) => config::ValueKind::Boolean(b),
            Self::Other { type_label, .. } if type_label == EMPTY_LIST => {
                config::ValueKind::Array(Vec::new())
            }
            Self::Other { type_label, .. } if type_label == EMPTY_MAP => {
                config::ValueKind::Table(config::Map::new())
            }
            Self::Other { display, .. } => config::ValueKind::String(display),
        }
    }
}

/// Floats compare by bit pattern, so `NaN` equals itself
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (
                Self::Other {
                    type_label: la,
                    display: da,
                },
                Self::Other {
                    type_label: lb,
                    display: db,
                },
            ) => la == lb && da == db,
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Other { display, .. } => f.write_str(display),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
