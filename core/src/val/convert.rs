use std::sync::Arc;

use anyhow::Result;

use crate::error::AdaptError;
use crate::typ::ValueType;

use super::Value;

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    #[inline]
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<i16> for Value {
    #[inline]
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Value::Str(Arc::<str>::from(s))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => Value::some(inner.into()),
            None => Value::Nullable(None),
        }
    }
}

impl Value {
    /// Integral reading used by numeric conversions. Floats round half to even.
    fn integral(&self) -> Option<i128> {
        match self {
            Value::Bool(b) => Some(*b as i128),
            Value::U8(v) => Some(*v as i128),
            Value::I16(v) => Some(*v as i128),
            Value::I32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::F32(v) if v.is_finite() => Some(v.round_ties_even() as i128),
            Value::F64(v) if v.is_finite() => Some(v.round_ties_even() as i128),
            Value::Str(s) => s.trim().parse::<i64>().ok().map(i128::from),
            _ => None,
        }
    }

    fn real(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::U8(v) => Some(*v as f64),
            Value::I16(v) => Some(*v as f64),
            Value::I32(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Converts a caller-supplied fixed value to a parameter type.
    ///
    /// Numeric conversions are range checked; strings parse; every primitive
    /// formats to a string. Null converts only to reference and nullable types.
    pub fn convert_to(&self, ty: &ValueType) -> Result<Value> {
        if self.is_instance_of(ty) {
            return Ok(self.clone());
        }
        let mismatch = || {
            anyhow::Error::new(AdaptError::ValueMismatch {
                value: self.to_string(),
                expected: ty.clone(),
            })
        };

        if let ValueType::Nullable(inner) = ty {
            if self.is_absent() {
                return Ok(Value::Nullable(None));
            }
            let unwrapped = match self {
                Value::Nullable(Some(v)) => v.as_ref(),
                other => other,
            };
            return Ok(Value::some(unwrapped.convert_to(inner)?));
        }
        if let Value::Nullable(Some(inner)) = self {
            return inner.convert_to(ty);
        }

        let converted = match ty {
            ValueType::Bool => match self {
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                other => other.real().map(|n| Value::Bool(n != 0.0)),
            },
            ValueType::U8 => self.integral().and_then(|n| u8::try_from(n).ok()).map(Value::U8),
            ValueType::I16 => self.integral().and_then(|n| i16::try_from(n).ok()).map(Value::I16),
            ValueType::I32 => self.integral().and_then(|n| i32::try_from(n).ok()).map(Value::I32),
            ValueType::I64 => self.integral().and_then(|n| i64::try_from(n).ok()).map(Value::I64),
            ValueType::F32 => self.real().map(|n| Value::F32(n as f32)),
            ValueType::F64 => self.real().map(Value::F64),
            ValueType::Str => match self {
                Value::Null => Some(Value::Null),
                Value::Bool(_)
                | Value::U8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::F32(_)
                | Value::F64(_) => Some(Value::from(self.to_string())),
                _ => None,
            },
            ValueType::Object | ValueType::Class(_) => match self {
                Value::Null | Value::Nullable(None) => Some(Value::Null),
                _ => None,
            },
            ValueType::Unit | ValueType::Struct(_) | ValueType::Nullable(_) => None,
        };
        converted.ok_or_else(mismatch)
    }

    /// Admits a host-supplied argument for a parameter of type `ty`.
    ///
    /// Only lossless changes apply: `I32` widens to `I64`, `F32` to `F64`,
    /// absent values fill nullable and reference slots, and bare values wrap
    /// into nullable slots. Anything that would truncate is refused.
    pub(crate) fn accept_as(self, ty: &ValueType) -> Option<Value> {
        if self.is_instance_of(ty) {
            return Some(self);
        }
        match (self, ty) {
            (Value::I32(n), ValueType::I64) => Some(Value::I64(n as i64)),
            (Value::F32(x), ValueType::F64) => Some(Value::F64(x as f64)),
            (Value::Null, ValueType::Nullable(_)) => Some(Value::Nullable(None)),
            (Value::Null | Value::Nullable(None), ValueType::Str | ValueType::Object | ValueType::Class(_)) => {
                Some(Value::Null)
            }
            (value, ValueType::Nullable(inner)) => value.accept_as(inner).map(Value::some),
            _ => None,
        }
    }

    /// Fits a value into a slot of type `ty` the way the evaluation stack does:
    /// 32-bit integers narrow to `Bool`, `U8` and `I16`, floats widen or narrow,
    /// and bare values wrap into nullable slots.
    pub(crate) fn coerce_to(self, ty: &ValueType) -> Option<Value> {
        if self.is_instance_of(ty) {
            return Some(self);
        }
        match (self, ty) {
            (Value::I32(n), ValueType::Bool) => Some(Value::Bool(n != 0)),
            (Value::I32(n), ValueType::U8) => Some(Value::U8(n as u8)),
            (Value::I32(n), ValueType::I16) => Some(Value::I16(n as i16)),
            (Value::I32(n), ValueType::I64) => Some(Value::I64(n as i64)),
            (Value::F64(x), ValueType::F32) => Some(Value::F32(x as f32)),
            (Value::F32(x), ValueType::F64) => Some(Value::F64(x as f64)),
            (Value::Null, ValueType::Nullable(_)) => Some(Value::Nullable(None)),
            (Value::Null | Value::Nullable(None), ValueType::Str | ValueType::Object | ValueType::Class(_)) => {
                Some(Value::Null)
            }
            (value, ValueType::Nullable(inner)) => value.coerce_to(inner).map(Value::some),
            _ => None,
        }
    }
}
