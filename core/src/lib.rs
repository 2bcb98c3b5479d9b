pub mod adapt;
pub mod emit;
pub mod error;
pub mod method;
pub mod typ;
pub mod val;

// Decoder and interpreter for generated bodies
pub mod vm;

pub use adapt::{DefaultPolicy, MethodGenerator, OverloadFactory, ParameterBinding, ParameterShape, generate};
pub use error::{AdaptError, ExecError};
pub use method::{NativeProcedure, ParameterDescriptor, Procedure, Signature};
pub use typ::{DefaultValueResolver, ValueType};
pub use val::Value;
pub use vm::GeneratedProcedure;
