use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use rustc_hash::FxHashSet;

use super::assemble;
use crate::emit::{BodyBuilder, OpCode, materialize, resolve_macro, short_index};
use crate::error::AdaptError;
use crate::method::{ParameterDescriptor, Procedure, Signature};
use crate::typ::DefaultValueResolver;
use crate::val::Value;
use crate::vm::GeneratedProcedure;

/// Values for the target parameters that follow the supplied ones.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterShape {
    /// By relative position in the trailing slice.
    Positional(Vec<Value>),
    /// By target parameter name.
    Named(HashMap<String, Value>),
}

impl ParameterShape {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ParameterShape::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        ParameterShape::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Adapts a target to a fixed leading signature, filling the rest of the
/// target's parameters from a [`ParameterShape`].
#[derive(Debug, Clone)]
pub struct MethodGenerator {
    resolver: Arc<DefaultValueResolver>,
}

impl Default for MethodGenerator {
    fn default() -> Self {
        Self::with_resolver(DefaultValueResolver::shared())
    }
}

impl MethodGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: Arc<DefaultValueResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<DefaultValueResolver> {
        &self.resolver
    }

    /// Builds `name(supplied...) -> target.return` that forwards its own
    /// arguments to the leading target parameters and injects the shape's
    /// values into the trailing ones.
    pub fn generate(
        &self,
        name: &str,
        supplied: &Signature,
        target: Arc<dyn Procedure>,
        shape: ParameterShape,
    ) -> Result<GeneratedProcedure> {
        let target_sig = target.signature();
        check_signature(supplied, target_sig)?;

        let mut builder = BodyBuilder::new();
        for index in 0..supplied.arity() {
            builder.push(resolve_macro(OpCode::LdargS, short_index("argument", index)?)?);
        }

        let trailing = &target_sig.params()[supplied.arity()..];
        let values = trailing_values(trailing, shape)?;
        for (param, value) in trailing.iter().zip(values) {
            let instrs = materialize(Some(&value), &param.ty, builder.locals_mut())?;
            builder.extend(instrs);
        }

        assemble(name, supplied.params().to_vec(), target, builder, &self.resolver)
    }
}

/// [`MethodGenerator::generate`] on the shared resolver.
pub fn generate(
    name: &str,
    supplied: &Signature,
    target: Arc<dyn Procedure>,
    shape: ParameterShape,
) -> Result<GeneratedProcedure> {
    MethodGenerator::default().generate(name, supplied, target, shape)
}

fn check_signature(supplied: &Signature, target: &Signature) -> Result<()> {
    if !target.return_type.is_assignable_from(&supplied.return_type) {
        return Err(anyhow::Error::new(AdaptError::SignatureMismatch {
            context: "return type".to_string(),
            expected: target.return_type.clone(),
            actual: supplied.return_type.clone(),
        }));
    }
    if supplied.arity() > target.arity() {
        return Err(anyhow::Error::new(AdaptError::ArityMismatch {
            available: target.arity(),
            supplied: supplied.arity(),
        }));
    }
    for (ours, theirs) in supplied.params().iter().zip(target.params()) {
        if !theirs.ty.is_assignable_from(&ours.ty) {
            return Err(anyhow::Error::new(AdaptError::SignatureMismatch {
                context: format!("parameter {}", ours.position),
                expected: theirs.ty.clone(),
                actual: ours.ty.clone(),
            }));
        }
    }
    Ok(())
}

/// One value per trailing parameter, falling back to declared defaults.
fn trailing_values(trailing: &[ParameterDescriptor], shape: ParameterShape) -> Result<Vec<Value>> {
    match shape {
        ParameterShape::Positional(values) => {
            if values.len() > trailing.len() {
                return Err(anyhow::Error::new(AdaptError::ArityMismatch {
                    available: trailing.len(),
                    supplied: values.len(),
                }));
            }
            let mut values = values.into_iter();
            trailing
                .iter()
                .map(|param| match values.next() {
                    Some(value) => Ok(value),
                    None => param.declared_default(),
                })
                .collect()
        }
        ParameterShape::Named(mut values) => {
            let known: FxHashSet<&str> = trailing.iter().filter_map(|p| p.name.as_deref()).collect();
            let mut unknown: Vec<String> = values
                .keys()
                .filter(|key| !known.contains(key.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                unknown.sort();
                return Err(anyhow::Error::new(AdaptError::UnknownName(unknown)));
            }
            trailing
                .iter()
                .map(|param| match param.name.as_ref().and_then(|name| values.remove(name)) {
                    Some(value) => Ok(value),
                    None => param.declared_default(),
                })
                .collect()
        }
    }
}
