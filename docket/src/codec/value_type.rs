use crate::common::Value;
use std::fmt::{Display, Formatter};

/// Self-describing tag written before every value by the typed-field codec.
///
/// Tags are stored as 4-byte little-endian unsigned integers.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Unknown = 0,
    String = 1,
    Int = 2,
    Bool = 3,
    Float = 4,
}

impl ValueType {
    /// Category of `value`; [ValueType::Unknown] for values no codec stores.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Float(_) => ValueType::Float,
            _ => ValueType::Unknown,
        }
    }

    /// Parses a stored tag. Unrecognized tags yield `None`.
    pub fn from_tag(tag: u32) -> Option<ValueType> {
        match tag {
            0 => Some(ValueType::Unknown),
            1 => Some(ValueType::String),
            2 => Some(ValueType::Int),
            3 => Some(ValueType::Bool),
            4 => Some(ValueType::Float),
            _ => None,
        }
    }

    pub fn tag(&self) -> u32 {
        *self as u32
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Unknown => write!(f, "unknown"),
            ValueType::String => write!(f, "string"),
            ValueType::Int => write!(f, "int"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Float => write!(f, "float"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(ValueType::Unknown.tag(), 0);
        assert_eq!(ValueType::String.tag(), 1);
        assert_eq!(ValueType::Int.tag(), 2);
        assert_eq!(ValueType::Bool.tag(), 3);
        assert_eq!(ValueType::Float.tag(), 4);
        assert_eq!(ValueType::from_tag(4), Some(ValueType::Float));
        assert_eq!(ValueType::from_tag(5), None);
    }

    #[test]
    fn categorizes_values() {
        assert_eq!(ValueType::of(&Value::from("test")), ValueType::String);
        assert_eq!(ValueType::of(&Value::from(2)), ValueType::Int);
        assert_eq!(ValueType::of(&Value::from(2.9)), ValueType::Float);
        assert_eq!(ValueType::of(&Value::from(true)), ValueType::Bool);
        assert_eq!(ValueType::of(&Value::Null), ValueType::Unknown);
        assert_eq!(ValueType::of(&Value::Array(vec![])), ValueType::Unknown);
    }
}
