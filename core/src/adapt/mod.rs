//! Procedure adaptation: the method generator and the overload factory.
//!
//! Both build a body that loads the generated procedure's own arguments and
//! injected values in target parameter order, then `call target; ret`.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::emit::{BodyBuilder, Instruction, OpCode};
use crate::method::{ParameterDescriptor, Procedure, Signature};
use crate::typ::DefaultValueResolver;
use crate::vm::GeneratedProcedure;

mod binding;
mod generator;
mod overload;

pub use binding::*;
pub use generator::*;
pub use overload::*;


/// Appends the tail call, encodes the body and wraps it in a handle.
fn assemble(
    name: &str,
    params: Vec<ParameterDescriptor>,
    target: Arc<dyn Procedure>,
    mut builder: BodyBuilder,
    resolver: &Arc<DefaultValueResolver>,
) -> Result<GeneratedProcedure> {
    let return_type = target.signature().return_type.clone();
    builder.push(Instruction::call(target.clone()));
    builder.push(Instruction::bare(OpCode::Ret));

    let body = builder.finish()?;
    debug!(
        target: "rebind::emit",
        procedure = name,
        target_name = target.name(),
        params = params.len(),
        code_len = body.code().len(),
        locals = body.locals().len(),
        "assembled procedure"
    );

    Ok(GeneratedProcedure::new(
        name,
        Signature::new(params, return_type),
        body,
        resolver.clone(),
    ))
}
