//! Error types for the physics kernel
//!
//! Two families:
//! - [`DomainFault`]: evaluation hit a mathematical singularity. Faults are
//!   values, never panics: providers return them, the acceleration solver
//!   resolves them to a fallback and records them for the caller
//! - [`ConstraintError`]: the constraint expression could not be compiled.
//!   Callers normally fail closed to the unconstrained model instead of
//!   propagating this

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Singularities the kernel detects and degrades around
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DomainFault {
    #[error("metric evaluated on the horizon (r = {r})")]
    HorizonSingularity { r: f64 },

    #[error("metric is not invertible (det = {det})")]
    DegenerateMetric { det: f64 },

    #[error("potential is singular near the evaluation point")]
    PotentialSingularity,

    #[error("constraint gradient vanishes under the inverse metric")]
    DegenerateConstraint,

    #[error("constraint derivatives are not finite")]
    NonFiniteConstraint,
}

/// Compile errors of the constraint expression language
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected token '{found}' at offset {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    Arity { name: String, expected: usize, found: usize },

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("expression has {tokens} tokens, limit is {limit}")]
    TooLong { tokens: usize, limit: usize },
}
