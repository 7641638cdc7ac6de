use std::error::Error;
use std::fmt::{Display, Formatter};

/// A list of input shapes not supported by the analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    AssignToNonLocal(String),
    AssignToArrayElement(String),
    AssignToArray(String),
    AssignToDouble(String),
    AssignToField(String),
    Expression(String),
    Condition(String),
    Statement(String),
    Invocation(String),
    NonConstantStart(String),
    AmbiguousAllocation(String),
    UnresolvedReceiver(String),
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssignToNonLocal(what) => {
                write!(f, "assignment to non-local variable: {}", what)
            }
            Self::AssignToArrayElement(what) => {
                write!(f, "assignment to array element: {}", what)
            }
            Self::AssignToArray(what) => {
                write!(f, "assignment to array: {}", what)
            }
            Self::AssignToDouble(what) => {
                write!(f, "assignment to double: {}", what)
            }
            Self::AssignToField(what) => {
                write!(f, "assignment to field: {}", what)
            }
            Self::Expression(what) => {
                write!(f, "expression: {}", what)
            }
            Self::Condition(what) => {
                write!(f, "condition: {}", what)
            }
            Self::Statement(what) => {
                write!(f, "statement: {}", what)
            }
            Self::Invocation(what) => {
                write!(f, "invocation: {}", what)
            }
            Self::NonConstantStart(what) => {
                write!(f, "non-constant start bound: {}", what)
            }
            Self::AmbiguousAllocation(what) => {
                write!(f, "ambiguous allocation site: {}", what)
            }
            Self::UnresolvedReceiver(what) => {
                write!(f, "receiver not resolved to any initializer: {}", what)
            }
        }
    }
}

/// A custom error message for the analysis engine
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Error during the loading of a serialized class
    LoadingError(String),
    /// Invalid assumption made about the program
    InvalidAssumption(String),
    /// Operation not supported yet
    NotSupportedYet(Unsupported),
    /// Failure reported by the numeric abstract domain
    DomainFailure(String),
    /// Invariant violation
    InvariantViolation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadingError(msg) => {
                write!(f, "[timeguard::loading] {}", msg)
            }
            Self::InvalidAssumption(msg) => {
                write!(f, "[timeguard::assumption] {}", msg)
            }
            Self::NotSupportedYet(item) => {
                write!(f, "[timeguard::unsupported] {}", item)
            }
            Self::DomainFailure(msg) => {
                write!(f, "[timeguard::domain] {}", msg)
            }
            Self::InvariantViolation(msg) => {
                write!(f, "[timeguard::invariant] {}", msg)
            }
        }
    }
}

impl Error for EngineError {}
