use crate::value::Value;
use std::{convert::TryFrom, fmt};

/// Instance type names of the `type` keyword. Matching against this enum
/// instead of strings keeps the hot type check cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

// One row per variant, in declaration order; both conversion directions
// read from this table.
const NAMES: [(PrimitiveType, &str); 7] = [
    (PrimitiveType::Array, "array"),
    (PrimitiveType::Boolean, "boolean"),
    (PrimitiveType::Integer, "integer"),
    (PrimitiveType::Null, "null"),
    (PrimitiveType::Number, "number"),
    (PrimitiveType::Object, "object"),
    (PrimitiveType::String, "string"),
];

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        NAMES[self as usize].1
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        NAMES
            .iter()
            .find(|(_, name)| *name == value)
            .map(|(primitive, _)| *primitive)
            .ok_or(())
    }
}

/// The primitive type of an instance value. A double never counts as
/// `integer`, matching draft-04 semantics.
pub fn primitive_type_of(value: &Value) -> PrimitiveType {
    match value {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Int(_) => PrimitiveType::Integer,
        Value::Double(_) => PrimitiveType::Number,
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}
