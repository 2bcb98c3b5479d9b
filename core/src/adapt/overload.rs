use std::sync::Arc;

use anyhow::Result;

use super::assemble;
use super::binding::{DefaultPolicy, ParameterBinding};
use crate::emit::{BodyBuilder, OpCode, materialize, resolve_macro, short_index};
use crate::error::AdaptError;
use crate::method::{ParameterDescriptor, Procedure};
use crate::typ::DefaultValueResolver;
use crate::val::Value;
use crate::vm::GeneratedProcedure;

/// Partial application over a window of target parameters.
///
/// Parameters inside the window are fixed or defaulted according to their
/// binding; `Forward` bindings and every parameter outside the window stay on
/// the generated procedure, in target order.
#[derive(Debug, Clone)]
pub struct OverloadFactory {
    resolver: Arc<DefaultValueResolver>,
}

impl Default for OverloadFactory {
    fn default() -> Self {
        Self::with_resolver(DefaultValueResolver::shared())
    }
}

impl OverloadFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: Arc<DefaultValueResolver>) -> Self {
        Self { resolver }
    }

    /// Binds the leading target parameters.
    pub fn bind_prefix(
        &self,
        name: &str,
        target: Arc<dyn Procedure>,
        bindings: &[ParameterBinding],
    ) -> Result<GeneratedProcedure> {
        self.bind_at(name, target, bindings, 0)
    }

    /// Binds the trailing target parameters.
    pub fn bind_suffix(
        &self,
        name: &str,
        target: Arc<dyn Procedure>,
        bindings: &[ParameterBinding],
    ) -> Result<GeneratedProcedure> {
        let available = target.signature().arity();
        let start = available.checked_sub(bindings.len()).ok_or_else(|| {
            anyhow::Error::new(AdaptError::ArityMismatch {
                available,
                supplied: bindings.len(),
            })
        })?;
        self.bind_at(name, target, bindings, start)
    }

    /// Binds target parameters `start..start + bindings.len()`.
    pub fn bind_at(
        &self,
        name: &str,
        target: Arc<dyn Procedure>,
        bindings: &[ParameterBinding],
        start: usize,
    ) -> Result<GeneratedProcedure> {
        let params = target.signature().params();
        start
            .checked_add(bindings.len())
            .filter(|end| *end <= params.len())
            .ok_or_else(|| {
                anyhow::Error::new(AdaptError::ArityMismatch {
                    available: params.len(),
                    supplied: start.saturating_add(bindings.len()),
                })
            })?;

        let mut builder = BodyBuilder::new();
        let mut kept: Vec<ParameterDescriptor> = Vec::with_capacity(params.len() - bindings.len());
        for (index, param) in params.iter().enumerate() {
            let binding = index
                .checked_sub(start)
                .and_then(|offset| bindings.get(offset))
                .unwrap_or(&ParameterBinding::Forward);

            let value = match binding {
                ParameterBinding::Forward => {
                    builder.push(resolve_macro(OpCode::LdargS, short_index("argument", kept.len())?)?);
                    kept.push(param.clone());
                    continue;
                }
                ParameterBinding::Fixed(value) => Some(value.convert_to(&param.ty)?),
                ParameterBinding::Default(policy) => self.default_for(param, *policy)?,
            };
            let instrs = materialize(value.as_ref(), &param.ty, builder.locals_mut())?;
            builder.extend(instrs);
        }

        assemble(name, kept, target, builder, &self.resolver)
    }

    fn default_for(&self, param: &ParameterDescriptor, policy: DefaultPolicy) -> Result<Option<Value>> {
        match policy {
            DefaultPolicy::Parameter => param.declared_default().map(Some),
            DefaultPolicy::Type => Ok(self.resolver.zero_value(&param.ty)),
            DefaultPolicy::ParameterOrType => match &param.default {
                Some(value) => Ok(Some(value.clone())),
                None => Ok(self.resolver.zero_value(&param.ty)),
            },
        }
    }
}
