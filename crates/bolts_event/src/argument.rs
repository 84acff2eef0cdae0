//! Persisted listener arguments

use bolts_core::ObjectHandle;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One stored argument of a persistent listener
///
/// Exactly one value is present, and its variant is its kind. Externally
/// tagged so both the JSON and the bincode encodings can carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgumentCell {
    Int(i32),
    Float(f32),
    Text(String),
    Bool(bool),
    Object(ObjectHandle),
}

/// The kind of an [`ArgumentCell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentKind {
    Int,
    Float,
    Text,
    Bool,
    Object,
}

impl ArgumentKind {
    /// All kinds, in declaration order
    pub const ALL: [ArgumentKind; 5] = [
        ArgumentKind::Int,
        ArgumentKind::Float,
        ArgumentKind::Text,
        ArgumentKind::Bool,
        ArgumentKind::Object,
    ];

    /// Get the kind name
    pub fn name(self) -> &'static str {
        match self {
            ArgumentKind::Int => "int",
            ArgumentKind::Float => "float",
            ArgumentKind::Text => "text",
            ArgumentKind::Bool => "bool",
            ArgumentKind::Object => "object",
        }
    }

    /// A cell of this kind holding the zero value, for freshly authored parameters
    pub fn default_cell(self) -> ArgumentCell {
        match self {
            ArgumentKind::Int => ArgumentCell::Int(0),
            ArgumentKind::Float => ArgumentCell::Float(0.0),
            ArgumentKind::Text => ArgumentCell::Text(String::new()),
            ArgumentKind::Bool => ArgumentCell::Bool(false),
            ArgumentKind::Object => ArgumentCell::Object(ObjectHandle::null()),
        }
    }
}

impl ArgumentCell {
    /// The kind of the active value
    pub fn kind(&self) -> ArgumentKind {
        match self {
            ArgumentCell::Int(_) => ArgumentKind::Int,
            ArgumentCell::Float(_) => ArgumentKind::Float,
            ArgumentCell::Text(_) => ArgumentKind::Text,
            ArgumentCell::Bool(_) => ArgumentKind::Bool,
            ArgumentCell::Object(_) => ArgumentKind::Object,
        }
    }

    /// Materialize the active value
    pub fn value(&self) -> Value {
        match self {
            ArgumentCell::Int(v) => Value::Int(*v),
            ArgumentCell::Float(v) => Value::Float(*v),
            ArgumentCell::Text(v) => Value::Text(v.clone()),
            ArgumentCell::Bool(v) => Value::Bool(*v),
            ArgumentCell::Object(v) => Value::Object(*v),
        }
    }

    /// Build a cell from a value. Opaque payloads cannot be persisted.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(ArgumentCell::Int(*v)),
            Value::Float(v) => Some(ArgumentCell::Float(*v)),
            Value::Text(v) => Some(ArgumentCell::Text(v.clone())),
            Value::Bool(v) => Some(ArgumentCell::Bool(*v)),
            Value::Object(v) => Some(ArgumentCell::Object(*v)),
            Value::Opaque(_) => None,
        }
    }
}

impl From<i32> for ArgumentCell {
    fn from(v: i32) -> Self {
        ArgumentCell::Int(v)
    }
}

impl From<f32> for ArgumentCell {
    fn from(v: f32) -> Self {
        ArgumentCell::Float(v)
    }
}

impl From<String> for ArgumentCell {
    fn from(v: String) -> Self {
        ArgumentCell::Text(v)
    }
}

impl From<&str> for ArgumentCell {
    fn from(v: &str) -> Self {
        ArgumentCell::Text(v.to_string())
    }
}

impl From<bool> for ArgumentCell {
    fn from(v: bool) -> Self {
        ArgumentCell::Bool(v)
    }
}

impl From<ObjectHandle> for ArgumentCell {
    fn from(v: ObjectHandle) -> Self {
        ArgumentCell::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_keeps_kind() {
        for kind in ArgumentKind::ALL {
            let cell = kind.default_cell();
            assert_eq!(cell.kind(), kind);
            assert_eq!(cell.value().type_name(), kind.name());
        }

        assert_eq!(ArgumentCell::from(5).value(), Value::Int(5));
        assert_eq!(ArgumentCell::from(1.5f32).value(), Value::Float(1.5));
        assert_eq!(ArgumentCell::from("hi").value(), Value::from("hi"));
    }

    #[test]
    fn test_opaque_not_persistable() {
        assert_eq!(ArgumentCell::from_value(&Value::opaque(3u8)), None);
        assert_eq!(
            ArgumentCell::from_value(&Value::Bool(true)),
            Some(ArgumentCell::Bool(true))
        );
    }

    #[test]
    fn test_json_shape() {
        let cells = vec![
            ArgumentCell::Int(5),
            ArgumentCell::Text("open".to_string()),
            ArgumentCell::Object(ObjectHandle::new(2, 0)),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[{"Int":5},{"Text":"open"},{"Object":2}]"#);

        let back: Vec<ArgumentCell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }
}
