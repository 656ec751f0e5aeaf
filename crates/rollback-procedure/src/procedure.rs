use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::args::CallArgs;
use crate::audit::AuditLog;
use crate::error::{CompensationError, ForwardActionError};
use crate::stack::ExecutionStack;
use crate::step::Step;

/// Lifecycle of a [`RollbackableProcedure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProcedureState {
    /// Constructed, nothing executed yet.
    Idle,
    /// Forward steps are executing.
    Running,
    /// Every forward step succeeded.
    Completed,
    /// Every recorded step was compensated.
    RolledBack,
    /// A compensation failed after the first one and rollback stopped.
    RollbackFailed,
}

impl fmt::Display for ProcedureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::RolledBack => "rolled back",
            Self::RollbackFailed => "rollback failed",
        };
        f.write_str(label)
    }
}

/// A domain-specific sequence of steps.
///
/// The definition holds the steps; the receiver is the state every action
/// operates on.
pub trait Procedure {
    /// State handed to every forward and compensating action.
    type Receiver;

    /// Error type returned by the procedure's actions.
    type Error: Error + Send + Sync + 'static;

    /// Name used in logs. Defaults to the short type name, without its
    /// module path or generic arguments.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Invoke the procedure's steps in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the runner then rolls back.
    fn perform(
        &self,
        ctx: &mut Context<'_, Self::Receiver, Self::Error>,
    ) -> Result<(), ForwardActionError<Self::Error>>;
}

/// Handle through which [`Procedure::perform`] invokes its steps.
pub struct Context<'a, R, E> {
    receiver: &'a mut R,
    stack: &'a mut ExecutionStack<R, E>,
    log: &'a mut AuditLog,
}

impl<R, E: Debug> Context<'_, R, E> {
    /// Invoke a step's forward action with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns the step's failure; the invocation stays on the stack either
    /// way.
    pub fn invoke(
        &mut self,
        step: &Arc<Step<R, E>>,
        args: CallArgs,
    ) -> Result<(), ForwardActionError<E>> {
        Step::invoke_forward(step, self.receiver, args, self.stack, self.log)
    }

    #[must_use]
    pub fn receiver(&self) -> &R {
        self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        self.receiver
    }

    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

/// Runs a [`Procedure`] and undoes it on failure.
///
/// Owns the receiver, the execution stack and the audit log for one
/// procedure instance.
pub struct RollbackableProcedure<P: Procedure> {
    definition: P,
    receiver: P::Receiver,
    stack: ExecutionStack<P::Receiver, P::Error>,
    log: AuditLog,
    state: ProcedureState,
    last_failure: Option<ForwardActionError<P::Error>>,
}

impl<P: Procedure> RollbackableProcedure<P> {
    #[must_use]
    pub fn new(definition: P, receiver: P::Receiver) -> Self {
        Self {
            definition,
            receiver,
            stack: ExecutionStack::new(),
            log: AuditLog::new(),
            state: ProcedureState::Idle,
            last_failure: None,
        }
    }

    /// Run the procedure, rolling back automatically if a step fails.
    ///
    /// The forward failure is logged and kept in
    /// [`last_failure`](Self::last_failure), never returned.
    ///
    /// # Errors
    ///
    /// Returns [`CompensationError`] if the automatic rollback aborted.
    pub fn run(&mut self) -> Result<ProcedureState, CompensationError<P::Error>> {
        info!(procedure = self.definition.name(), "running procedure");
        self.state = ProcedureState::Running;

        let mut ctx = Context {
            receiver: &mut self.receiver,
            stack: &mut self.stack,
            log: &mut self.log,
        };
        match self.definition.perform(&mut ctx) {
            Ok(()) => {
                self.state = ProcedureState::Completed;
            }
            Err(failure) => {
                error!(
                    procedure = self.definition.name(),
                    error = %error_chain(&failure),
                    "failed to run procedure"
                );
                self.last_failure = Some(failure);
                self.rollback()?;
            }
        }
        Ok(self.state)
    }

    /// Compensate every recorded step, most recent first.
    ///
    /// The first compensation attempted may fail without stopping the
    /// rollback, since the most recent frame may belong to an action that
    /// failed before doing anything. Any later failure stops the rollback and
    /// leaves the remaining frames on the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CompensationError`] for the first failure after the first
    /// attempt.
    pub fn rollback(&mut self) -> Result<(), CompensationError<P::Error>> {
        info!(
            procedure = self.definition.name(),
            depth = self.stack.len(),
            "rolling back procedure"
        );

        let mut attempted = 0_usize;
        while let Some(frame) = self.stack.pop() {
            let result = frame
                .step()
                .invoke_compensating(&mut self.receiver, &frame, &mut self.log);
            attempted += 1;

            if let Err(failure) = result {
                if attempted == 1 {
                    warn!(
                        procedure = self.definition.name(),
                        step = failure.step(),
                        error = %error_chain(&failure),
                        "ignoring failed compensation of the most recent step"
                    );
                    continue;
                }
                error!(
                    procedure = self.definition.name(),
                    step = failure.step(),
                    remaining = self.stack.len(),
                    error = %error_chain(&failure),
                    backtrace = %Backtrace::capture(),
                    "failed to revert"
                );
                self.state = ProcedureState::RollbackFailed;
                return Err(failure);
            }
        }

        self.state = ProcedureState::RolledBack;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> ProcedureState {
        self.state
    }

    /// Everything executed so far, in order.
    #[must_use]
    pub fn actions_log(&self) -> &AuditLog {
        &self.log
    }

    /// Number of forward invocations not yet compensated.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn stack(&self) -> &ExecutionStack<P::Receiver, P::Error> {
        &self.stack
    }

    /// The forward failure that triggered the last automatic rollback.
    #[must_use]
    pub fn last_failure(&self) -> Option<&ForwardActionError<P::Error>> {
        self.last_failure.as_ref()
    }

    /// Take ownership of the last forward failure, leaving `None` behind.
    pub fn take_last_failure(&mut self) -> Option<ForwardActionError<P::Error>> {
        self.last_failure.take()
    }

    #[must_use]
    pub fn definition(&self) -> &P {
        &self.definition
    }

    #[must_use]
    pub fn receiver(&self) -> &P::Receiver {
        &self.receiver
    }
}

fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
