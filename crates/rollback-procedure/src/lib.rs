//! Compensating-action execution engine.
//!
//! A procedure is an ordered sequence of steps, each pairing a forward action
//! with a compensating action. Every forward call is recorded on a LIFO stack
//! before it runs; if the procedure fails, the recorded calls are undone in
//! reverse order. A compensation may declare fewer parameters than its
//! forward action, in any order: its arguments are derived by name from the
//! recorded forward call.

mod args;
mod audit;
mod binder;
mod builder;
mod error;
mod procedure;
mod signature;
mod stack;
mod step;

pub use args::{Arguments, CallArgs};
pub use audit::{ActionKind, AuditEntry, AuditLog};
pub use binder::{ProjectionPlan, bind};
pub use builder::{HasForward, NeedsForward, StepBuilder};
pub use error::{ArgumentError, BindingError, CompensationError, ForwardActionError};
pub use procedure::{Context, Procedure, ProcedureState, RollbackableProcedure};
pub use serde_json::Value;
pub use signature::Signature;
pub use stack::{ExecutionStack, Frame};
pub use step::{Action, Step};
