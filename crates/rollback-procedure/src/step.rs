use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::debug;

use crate::args::{Arguments, CallArgs};
use crate::audit::AuditLog;
use crate::binder::ProjectionPlan;
use crate::builder::{NeedsForward, StepBuilder};
use crate::error::{BindingError, CompensationError, ForwardActionError};
use crate::signature::Signature;
use crate::stack::{ExecutionStack, Frame};

/// Callable half of a step: the receiver plus the bound call arguments.
pub type Action<R, E> = Box<dyn Fn(&mut R, &Arguments<'_>) -> Result<(), E> + Send + Sync>;

/// A forward action paired with the compensating action that undoes it.
///
/// Steps are immutable once built and are shared (through `Arc`) by every
/// frame that records an invocation of them.
pub struct Step<R, E> {
    name: &'static str,
    forward_signature: Signature,
    compensating_signature: Signature,
    forward: Action<R, E>,
    compensating: Action<R, E>,
    plan: ProjectionPlan,
}

impl<R, E> Step<R, E> {
    /// Start declaring a step.
    ///
    /// ```
    /// use rollback_procedure::{Signature, Step};
    ///
    /// let insert = Step::<Vec<String>, std::io::Error>::builder("insert")
    ///     .forward(Signature::new(["item", "note"]), |items, args| {
    ///         items.push(args.str("item").unwrap_or_default().to_string());
    ///         Ok(())
    ///     })
    ///     .compensate(Signature::new(["item"]), |items, _args| {
    ///         items.pop();
    ///         Ok(())
    ///     })
    ///     .expect("`item` is a forward parameter");
    ///
    /// assert_eq!(insert.plan().positional(), [0]);
    /// ```
    ///
    /// A step cannot be built without its compensation:
    ///
    /// ```compile_fail
    /// use rollback_procedure::{Signature, Step};
    ///
    /// let step = Step::<(), std::io::Error>::builder("half")
    ///     .forward(Signature::empty(), |_, _| Ok(()))
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder(name: &'static str) -> StepBuilder<R, E, NeedsForward> {
        StepBuilder::new(name)
    }

    /// Build a step whose compensation does nothing, for actions without
    /// side effects.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateParameter`] if `signature` repeats a name.
    pub fn read_only<F>(
        name: &'static str,
        signature: Signature,
        action: F,
    ) -> Result<Arc<Self>, BindingError>
    where
        F: Fn(&mut R, &Arguments<'_>) -> Result<(), E> + Send + Sync + 'static,
        R: 'static,
        E: 'static,
    {
        Self::builder(name)
            .forward(signature, action)
            .compensate(Signature::empty(), |_, _| Ok(()))
    }

    pub(crate) fn from_parts(
        name: &'static str,
        forward_signature: Signature,
        forward: Action<R, E>,
        compensating_signature: Signature,
        compensating: Action<R, E>,
        plan: ProjectionPlan,
    ) -> Self {
        Self {
            name,
            forward_signature,
            compensating_signature,
            forward,
            compensating,
            plan,
        }
    }

    /// Identity used in the audit log and diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn forward_signature(&self) -> &Signature {
        &self.forward_signature
    }

    #[must_use]
    pub fn compensating_signature(&self) -> &Signature {
        &self.compensating_signature
    }

    #[must_use]
    pub fn plan(&self) -> &ProjectionPlan {
        &self.plan
    }

    /// Record and run the forward action.
    ///
    /// The frame is pushed and the audit entry appended before anything else,
    /// so a failing invocation is still compensated on rollback. Arguments
    /// that do not fit the forward signature are recorded too, but the
    /// action is not run.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardActionError::Arguments`] for ill-fitting arguments and
    /// [`ForwardActionError::Action`] when the action fails.
    pub fn invoke_forward(
        step: &Arc<Self>,
        receiver: &mut R,
        args: CallArgs,
        stack: &mut ExecutionStack<R, E>,
        log: &mut AuditLog,
    ) -> Result<(), ForwardActionError<E>>
    where
        E: Debug,
    {
        debug!(step = step.name, args = %args, "running action");
        stack.push(Frame::new(Arc::clone(step), args.clone()));
        log.record_forward(step.name, args.clone());

        args.check_against(&step.forward_signature)
            .map_err(|source| ForwardActionError::Arguments {
                step: step.name.to_string(),
                source,
            })?;

        (step.forward)(receiver, &Arguments::new(&step.forward_signature, &args)).map_err(
            |source| ForwardActionError::Action {
                step: step.name.to_string(),
                source,
            },
        )
    }

    /// Project a recorded frame's arguments and run the compensating action.
    ///
    /// Nothing is logged when the recorded arguments cannot be projected.
    ///
    /// # Errors
    ///
    /// Returns [`CompensationError::Arguments`] if the projection fails and
    /// [`CompensationError::Action`] wrapping the compensating action's error.
    pub fn invoke_compensating(
        &self,
        receiver: &mut R,
        frame: &Frame<R, E>,
        log: &mut AuditLog,
    ) -> Result<(), CompensationError<E>>
    where
        E: Debug,
    {
        let projected =
            self.plan
                .project(frame.args())
                .map_err(|source| CompensationError::Arguments {
                    step: self.name.to_string(),
                    args: frame.args().clone(),
                    source,
                })?;

        debug!(step = self.name, args = %projected, "running compensation");
        log.record_compensating(self.name, projected.clone());

        let result = (self.compensating)(
            receiver,
            &Arguments::new(&self.compensating_signature, &projected),
        );
        result.map_err(|source| CompensationError::Action {
            step: self.name.to_string(),
            args: projected,
            source,
        })
    }
}

impl<R, E> Debug for Step<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("forward_signature", &self.forward_signature)
            .field("compensating_signature", &self.compensating_signature)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::audit::ActionKind;

    #[derive(Default)]
    struct Files {
        names: Vec<String>,
        removed: Vec<String>,
    }

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    fn insert_step() -> Arc<Step<Files, TestError>> {
        Step::builder("insert_file")
            .forward(
                Signature::new(["file_name", "content"]),
                |files: &mut Files, args| {
                    let name = args.str("file_name").map_err(|e| TestError(e.to_string()))?;
                    files.names.push(name.to_string());
                    Ok(())
                },
            )
            .compensate(Signature::new(["file_name"]), |files: &mut Files, args| {
                let name = args.str("file_name").map_err(|e| TestError(e.to_string()))?;
                files.removed.push(name.to_string());
                Ok(())
            })
            .expect("insert_file binds")
    }

    #[test]
    fn invoke_forward_pushes_logs_and_runs() -> anyhow::Result<()> {
        let step = insert_step();
        let mut files = Files::default();
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();

        Step::invoke_forward(
            &step,
            &mut files,
            CallArgs::from_positional(["a.txt", "Hello a"]),
            &mut stack,
            &mut log,
        )?;

        assert_eq!(files.names, ["a.txt"]);
        assert_eq!(stack.len(), 1);
        assert_eq!(log.entries()[0].kind, ActionKind::Forward);
        assert_eq!(log.entries()[0].step, "insert_file");
        assert_eq!(
            log.entries()[0].args,
            CallArgs::from_positional(["a.txt", "Hello a"])
        );
        Ok(())
    }

    #[test]
    fn failing_forward_action_is_still_recorded() {
        let step: Arc<Step<Files, TestError>> = Step::builder("explode")
            .forward(Signature::empty(), |_: &mut Files, _| {
                Err(TestError("boom".to_string()))
            })
            .compensate(Signature::empty(), |_: &mut Files, _| Ok(()))
            .expect("explode binds");
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();

        let result = Step::invoke_forward(
            &step,
            &mut Files::default(),
            CallArgs::new(),
            &mut stack,
            &mut log,
        );

        assert!(matches!(
            result,
            Err(ForwardActionError::Action { step, source }) if step == "explode" && source == TestError("boom".to_string())
        ));
        assert_eq!(stack.len(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn ill_fitting_arguments_are_recorded_but_not_run() {
        let step = insert_step();
        let mut files = Files::default();
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();

        let result = Step::invoke_forward(
            &step,
            &mut files,
            CallArgs::from_positional(["a.txt"]),
            &mut stack,
            &mut log,
        );

        assert!(matches!(result, Err(ForwardActionError::Arguments { .. })));
        assert_eq!(stack.len(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].args, CallArgs::from_positional(["a.txt"]));
        assert!(files.names.is_empty());
    }

    #[test]
    fn compensating_a_short_call_fails_without_running() {
        let step = insert_step();
        let mut files = Files::default();
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();
        let _ = Step::invoke_forward(&step, &mut files, CallArgs::new(), &mut stack, &mut log);

        let frame = stack.pop().expect("rejected call still pushes a frame");
        let err = step
            .invoke_compensating(&mut files, &frame, &mut log)
            .expect_err("file_name was never recorded");

        assert!(matches!(
            err,
            CompensationError::Arguments { ref step, .. } if step == "insert_file"
        ));
        assert_eq!(err.args(), &CallArgs::new());
        assert!(files.removed.is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn invoke_compensating_uses_projected_arguments() -> anyhow::Result<()> {
        let step = insert_step();
        let mut files = Files::default();
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();
        Step::invoke_forward(
            &step,
            &mut files,
            CallArgs::from_positional(["b.txt", "Hello b"]),
            &mut stack,
            &mut log,
        )?;

        let frame = stack.pop().expect("frame was pushed");
        step.invoke_compensating(&mut files, &frame, &mut log)?;

        assert_eq!(files.removed, ["b.txt"]);
        let entry = &log.entries()[1];
        assert_eq!(entry.kind, ActionKind::Compensating);
        assert_eq!(entry.args.positional(), [json!("b.txt")]);
        Ok(())
    }

    #[test]
    fn compensation_error_carries_step_and_arguments() -> anyhow::Result<()> {
        let step: Arc<Step<Files, TestError>> = Step::builder("stubborn")
            .forward(Signature::new(["x"]), |_: &mut Files, _| Ok(()))
            .compensate(Signature::new(["x"]), |_: &mut Files, _| {
                Err(TestError("cannot undo".to_string()))
            })?;
        let mut files = Files::default();
        let mut stack = ExecutionStack::new();
        let mut log = AuditLog::new();
        Step::invoke_forward(
            &step,
            &mut files,
            CallArgs::from_positional([1]),
            &mut stack,
            &mut log,
        )?;

        let frame = stack.pop().expect("frame was pushed");
        let err = step
            .invoke_compensating(&mut files, &frame, &mut log)
            .expect_err("compensation fails");

        assert_eq!(err.step(), "stubborn");
        assert_eq!(err.args(), &CallArgs::from_positional([1]));
        assert!(matches!(
            err,
            CompensationError::Action { source, .. } if source == TestError("cannot undo".to_string())
        ));
        assert_eq!(log.len(), 2);
        Ok(())
    }

    #[test]
    fn read_only_step_compensates_without_effect() -> anyhow::Result<()> {
        let step: Arc<Step<Files, TestError>> =
            Step::read_only("inspect", Signature::new(["path"]), |_: &mut Files, _| Ok(()))?;

        assert!(step.compensating_signature().required().is_empty());
        assert!(step.plan().positional().is_empty());
        Ok(())
    }
}
