use std::fmt;

use crate::val::Value;

/// Where an injected default comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultPolicy {
    /// The parameter's declared default; the parameter must be optional.
    Parameter,
    /// The zero value of the parameter type.
    Type,
    /// The declared default when there is one, the zero value otherwise.
    ParameterOrType,
}

/// How one target parameter is bound by the overload factory.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterBinding {
    /// Keep the parameter on the generated procedure.
    Forward,
    /// Inject this value, converted to the parameter type.
    Fixed(Value),
    /// Inject a default chosen by the policy.
    Default(DefaultPolicy),
}

impl ParameterBinding {
    pub fn fixed(value: impl Into<Value>) -> Self {
        ParameterBinding::Fixed(value.into())
    }
}

impl From<DefaultPolicy> for ParameterBinding {
    fn from(policy: DefaultPolicy) -> Self {
        ParameterBinding::Default(policy)
    }
}

impl fmt::Display for ParameterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterBinding::Forward => write!(f, "_"),
            ParameterBinding::Fixed(v) => write!(f, "{}", v),
            ParameterBinding::Default(policy) => write!(f, "default({:?})", policy),
        }
    }
}
