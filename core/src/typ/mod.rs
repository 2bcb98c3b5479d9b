use std::{fmt, sync::Arc};

use serde::Serialize;

mod defaults;


pub use defaults::DefaultValueResolver;

/// Layout of a user-defined value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<(String, ValueType)>,
}

impl StructType {
    pub fn new(name: impl Into<String>, fields: Vec<(String, ValueType)>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fields,
        })
    }
}

/// Declared type of a parameter, local or return slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    /// No value; only meaningful as a return type.
    Unit,
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Immutable string (a reference type that still encodes inline).
    Str,
    /// Nullable wrapper over a value type: `I32?`
    Nullable(Box<ValueType>),
    /// User-defined value type, zero-initialized field by field.
    Struct(Arc<StructType>),
    /// Top reference type; everything is assignable to it.
    Object,
    /// Named reference type.
    Class(Arc<str>),
}

impl ValueType {
    pub fn nullable(inner: ValueType) -> Self {
        ValueType::Nullable(Box::new(inner))
    }

    pub fn class(name: &str) -> Self {
        ValueType::Class(Arc::from(name))
    }

    /// True for types whose default-initialized instance is a value rather than null.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, ValueType::Str | ValueType::Object | ValueType::Class(_))
    }

    /// Types the materializer is willing to look at: value types plus strings.
    pub fn is_simple(&self) -> bool {
        self.is_value_type() || matches!(self, ValueType::Str)
    }

    /// Underlying type of a nullable wrapper.
    pub fn nullable_underlying(&self) -> Option<&ValueType> {
        match self {
            ValueType::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether a value of type `other` can be stored where `self` is expected.
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        if self == other {
            return true;
        }
        match self {
            ValueType::Object => true,
            ValueType::Nullable(inner) => inner.as_ref() == other,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unit => write!(f, "Unit"),
            ValueType::Bool => write!(f, "Bool"),
            ValueType::U8 => write!(f, "U8"),
            ValueType::I16 => write!(f, "I16"),
            ValueType::I32 => write!(f, "I32"),
            ValueType::I64 => write!(f, "I64"),
            ValueType::F32 => write!(f, "F32"),
            ValueType::F64 => write!(f, "F64"),
            ValueType::Str => write!(f, "String"),
            ValueType::Nullable(inner) => write!(f, "{}?", inner),
            ValueType::Struct(def) => write!(f, "{}", def.name),
            ValueType::Object => write!(f, "Object"),
            ValueType::Class(name) => write!(f, "{}", name),
        }
    }
}
