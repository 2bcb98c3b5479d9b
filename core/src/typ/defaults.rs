use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use super::ValueType;
use crate::val::{StructValue, Value};

static SHARED: Lazy<Arc<DefaultValueResolver>> = Lazy::new(|| Arc::new(DefaultValueResolver::new()));

/// Memoized zero values keyed by type.
///
/// Lookups go through the `DashMap` entry API, so a type's zero value is
/// constructed at most once even when many threads ask for it first at the
/// same time.
#[derive(Debug, Default)]
pub struct DefaultValueResolver {
    zeros: DashMap<ValueType, Value>,
    constructions: AtomicUsize,
}

impl DefaultValueResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide resolver used by the default generator and factory.
    pub fn shared() -> Arc<DefaultValueResolver> {
        SHARED.clone()
    }

    /// Default-initialized value of `ty`; `None` for reference types.
    pub fn zero_value(&self, ty: &ValueType) -> Option<Value> {
        if !ty.is_value_type() {
            return None;
        }
        if let Some(hit) = self.zeros.get(ty) {
            return Some(hit.value().clone());
        }
        let entry = self.zeros.entry(ty.clone()).or_insert_with(|| {
            self.constructions.fetch_add(1, Ordering::Relaxed);
            trace!(target: "rebind::defaults", ty = %ty, "constructing zero value");
            construct_zero(ty)
        });
        Some(entry.value().clone())
    }

    /// Number of zero values built so far.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.zeros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zeros.is_empty()
    }
}

fn construct_zero(ty: &ValueType) -> Value {
    match ty {
        ValueType::Unit => Value::Unit,
        ValueType::Bool => Value::Bool(false),
        ValueType::U8 => Value::U8(0),
        ValueType::I16 => Value::I16(0),
        ValueType::I32 => Value::I32(0),
        ValueType::I64 => Value::I64(0),
        ValueType::F32 => Value::F32(0.0),
        ValueType::F64 => Value::F64(0.0),
        ValueType::Nullable(_) => Value::Nullable(None),
        ValueType::Struct(def) => Value::Struct(Arc::new(StructValue {
            ty: def.clone(),
            fields: def
                .fields
                .iter()
                .map(|(_, field)| construct_zero(field))
                .collect(),
        })),
        ValueType::Str | ValueType::Object | ValueType::Class(_) => Value::Null,
    }
}
