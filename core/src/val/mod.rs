use std::{any::Any, fmt, sync::Arc};

use crate::typ::{StructType, ValueType};

mod convert;


/// Opaque reference-type instance. Compared by identity.
#[derive(Clone)]
pub struct ObjectRef {
    class: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(class: &str, payload: T) -> Self {
        Self {
            class: Arc::from(class),
            payload: Arc::new(payload),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} @ {:p}>", self.class, Arc::as_ptr(&self.payload))
    }
}

/// Instance of a user-defined value type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub ty: Arc<StructType>,
    pub fields: Vec<Value>,
}

/// Runtime value flowing through generated procedures.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    /// Nullable wrapper; `None` is the empty wrapper.
    Nullable(Option<Box<Value>>),
    Struct(Arc<StructValue>),
    Object(ObjectRef),
    /// Null reference.
    Null,
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn some(inner: Value) -> Self {
        Value::Nullable(Some(Box::new(inner)))
    }

    /// Null references and empty nullable wrappers carry no value to encode.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Null | Value::Nullable(None))
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Unit => "Unit".into(),
            Value::Bool(_) => "Bool".into(),
            Value::U8(_) => "U8".into(),
            Value::I16(_) => "I16".into(),
            Value::I32(_) => "I32".into(),
            Value::I64(_) => "I64".into(),
            Value::F32(_) => "F32".into(),
            Value::F64(_) => "F64".into(),
            Value::Str(_) => "String".into(),
            Value::Nullable(Some(inner)) => format!("{}?", inner.type_name()),
            Value::Nullable(None) => "Nullable".into(),
            Value::Struct(s) => s.ty.name.clone(),
            Value::Object(obj) => obj.class().to_string(),
            Value::Null => "Null".into(),
        }
    }

    /// Exact runtime type check, with `Object` accepting any reference.
    pub fn is_instance_of(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Value::Unit, ValueType::Unit)
            | (Value::Bool(_), ValueType::Bool)
            | (Value::U8(_), ValueType::U8)
            | (Value::I16(_), ValueType::I16)
            | (Value::I32(_), ValueType::I32)
            | (Value::I64(_), ValueType::I64)
            | (Value::F32(_), ValueType::F32)
            | (Value::F64(_), ValueType::F64)
            | (Value::Str(_), ValueType::Str) => true,
            (Value::Nullable(None), ValueType::Nullable(_)) => true,
            (Value::Nullable(Some(inner)), ValueType::Nullable(u)) => inner.is_instance_of(u),
            (Value::Struct(s), ValueType::Struct(def)) => s.ty == *def,
            (Value::Object(obj), ValueType::Class(name)) => obj.class() == name.as_ref(),
            (_, ValueType::Object) => !self.is_absent() && !matches!(self, Value::Unit),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nullable(a), Value::Nullable(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::U8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Nullable(Some(inner)) => write!(f, "{}", inner),
            Value::Nullable(None) | Value::Null => write!(f, "null"),
            Value::Struct(s) => {
                write!(f, "{} {{", s.ty.name)?;
                for (idx, ((name, _), value)) in s.ty.fields.iter().zip(s.fields.iter()).enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}
