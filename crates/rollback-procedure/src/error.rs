use std::fmt::Debug;

use thiserror::Error;

use crate::args::CallArgs;

/// Error raised while registering a step whose compensation cannot be bound
/// to its forward action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindingError {
    /// A compensating positional parameter has no forward counterpart.
    #[error("step '{step}': compensating parameter '{name}' is not a required parameter of the forward action")]
    UnknownPositional {
        /// Step being registered.
        step: String,
        /// Offending parameter name.
        name: String,
    },

    /// A compensating keyword parameter has no forward counterpart.
    #[error("step '{step}': compensating keyword '{name}' is not a defaulted parameter of the forward action")]
    UnknownKeyword {
        /// Step being registered.
        step: String,
        /// Offending parameter name.
        name: String,
    },

    /// A signature declares the same name twice.
    #[error("step '{step}': parameter '{name}' is declared more than once")]
    DuplicateParameter {
        /// Step being registered.
        step: String,
        /// Offending parameter name.
        name: String,
    },
}

/// Error raised when call arguments do not fit an action's signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArgumentError {
    /// Wrong number of positional arguments.
    #[error("expected {expected} positional argument(s), got {actual}")]
    Arity {
        /// Number of required parameters.
        expected: usize,
        /// Number of supplied positional arguments.
        actual: usize,
    },

    /// A keyword argument was supplied that the signature does not declare.
    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    /// A parameter was looked up that has neither a value nor a default.
    #[error("missing argument '{0}'")]
    Missing(String),

    /// A parameter holds a value of the wrong JSON type.
    #[error("argument '{name}' should be {expected}")]
    Type {
        /// Parameter name.
        name: String,
        /// Human readable expected type.
        expected: &'static str,
    },
}

/// Failure surfaced while running a procedure's forward steps.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ForwardActionError<E: Debug> {
    /// The call arguments did not match the step's forward signature.
    ///
    /// The call is still recorded on the stack and in the audit log; the
    /// forward action is not run.
    #[error("step '{step}' was called with invalid arguments")]
    Arguments {
        /// Step that was invoked.
        step: String,
        /// What was wrong with the arguments.
        #[source]
        source: ArgumentError,
    },

    /// The forward action itself failed.
    #[error("step '{step}' failed")]
    Action {
        /// Step that failed.
        step: String,
        /// The error returned by the action.
        #[source]
        source: E,
    },

    /// The procedure stopped on its own, outside of any step.
    #[error("procedure aborted")]
    Aborted(#[source] E),
}

impl<E: Debug> ForwardActionError<E> {
    /// Name of the step that failed, if the failure came from a step.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::Arguments { step, .. } | Self::Action { step, .. } => Some(step),
            Self::Aborted(_) => None,
        }
    }
}

/// Failure of a compensating action during rollback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompensationError<E: Debug> {
    /// The recorded forward arguments could not be projected onto the
    /// compensation, so the compensating action was never called.
    #[error("compensation for step '{step}' cannot be called with the recorded arguments")]
    Arguments {
        /// Step whose compensation failed.
        step: String,
        /// Forward arguments recorded in the frame.
        args: CallArgs,
        /// What was wrong with the arguments.
        #[source]
        source: ArgumentError,
    },

    /// The compensating action itself failed.
    #[error("compensation failed for step '{step}'")]
    Action {
        /// Step whose compensation failed.
        step: String,
        /// Arguments the compensating action was called with.
        args: CallArgs,
        /// The error returned by the compensating action.
        #[source]
        source: E,
    },
}

impl<E: Debug> CompensationError<E> {
    /// Name of the step whose compensation failed.
    #[must_use]
    pub fn step(&self) -> &str {
        match self {
            Self::Arguments { step, .. } | Self::Action { step, .. } => step,
        }
    }

    /// Arguments attached to the failure.
    #[must_use]
    pub fn args(&self) -> &CallArgs {
        match self {
            Self::Arguments { args, .. } | Self::Action { args, .. } => args,
        }
    }
}
