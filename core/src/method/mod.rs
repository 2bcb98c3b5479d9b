//! Procedure descriptors and the `Procedure` seam.
//!
//! Everything the generator and the overload factory know about a target
//! comes through [`Procedure::signature`]; everything they produce is itself a
//! [`Procedure`], so adaptations can be stacked.

use std::{fmt, sync::Arc};

use anyhow::Result;

use crate::error::{AdaptError, ExecError};
use crate::typ::ValueType;
use crate::val::Value;


/// One declared parameter of a procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: Option<String>,
    pub ty: ValueType,
    pub position: usize,
    /// Recorded default; present exactly when the parameter is optional.
    pub default: Option<Value>,
}

impl ParameterDescriptor {
    pub fn required(name: &str, ty: ValueType) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            position: 0,
            default: None,
        }
    }

    pub fn optional(name: &str, ty: ValueType, default: Value) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            position: 0,
            default: Some(default),
        }
    }

    pub fn unnamed(ty: ValueType) -> Self {
        Self {
            name: None,
            ty,
            position: 0,
            default: None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    /// The recorded default, or `MissingDefault` when the parameter is required.
    pub fn declared_default(&self) -> Result<Value> {
        self.default.clone().ok_or_else(|| {
            anyhow::Error::new(AdaptError::MissingDefault {
                parameter: self.display_name(),
            })
        })
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}: {}", name, self.ty),
            None => format!("#{}: {}", self.position, self.ty),
        }
    }
}

/// Parameter list in declaration order plus return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    params: Vec<ParameterDescriptor>,
    pub return_type: ValueType,
}

impl Signature {
    /// Builds a signature, renumbering positions to declaration order.
    pub fn new(params: Vec<ParameterDescriptor>, return_type: ValueType) -> Self {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(position, mut param)| {
                param.position = position;
                param
            })
            .collect();
        Self { params, return_type }
    }

    /// Unnamed, required parameters of the given types.
    pub fn of_types(types: &[ValueType], return_type: ValueType) -> Self {
        Self::new(
            types.iter().cloned().map(ParameterDescriptor::unnamed).collect(),
            return_type,
        )
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> impl Iterator<Item = &ValueType> {
        self.params.iter().map(|p| &p.ty)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            match &param.name {
                Some(name) => write!(f, "{}: {}", name, param.ty)?,
                None => write!(f, "{}", param.ty)?,
            }
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// A callable with a reflected signature.
pub trait Procedure: Send + Sync {
    fn name(&self) -> &str;

    fn signature(&self) -> &Signature;

    /// Calls the procedure. Arguments are checked against the signature.
    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

impl fmt::Debug for dyn Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.signature())
    }
}

/// Checks arity and fits each argument into its parameter slot.
pub(crate) fn bind_arguments(name: &str, signature: &Signature, args: &[Value]) -> Result<Vec<Value>> {
    if args.len() != signature.arity() {
        return Err(anyhow::Error::new(ExecError::ArgumentCount {
            procedure: name.to_string(),
            expected: signature.arity(),
            got: args.len(),
        }));
    }
    args.iter()
        .zip(signature.params())
        .enumerate()
        .map(|(index, (arg, param))| {
            arg.clone().accept_as(&param.ty).ok_or_else(|| {
                anyhow::Error::new(ExecError::ArgumentType {
                    procedure: name.to_string(),
                    index,
                    expected: param.ty.clone(),
                    got: arg.type_name(),
                })
            })
        })
        .collect()
}

pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// Host function exposed as a target procedure.
#[derive(Clone)]
pub struct NativeProcedure {
    name: String,
    signature: Signature,
    func: Arc<NativeFn>,
}

impl NativeProcedure {
    pub fn new<F>(name: &str, signature: Signature, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            signature,
            func: Arc::new(func),
        }
    }

    pub fn into_arc(self) -> Arc<dyn Procedure> {
        Arc::new(self)
    }
}

impl fmt::Debug for NativeProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native {}{}", self.name, self.signature)
    }
}

impl Procedure for NativeProcedure {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        let args = bind_arguments(&self.name, &self.signature, args)?;
        (self.func)(&args)
    }
}
