use std::marker::PhantomData;
use std::sync::Arc;

use crate::args::Arguments;
use crate::binder::bind;
use crate::error::BindingError;
use crate::signature::Signature;
use crate::step::{Action, Step};

/// Marker type for a builder that has no forward action yet.
pub struct NeedsForward;

/// Marker type for a builder holding its forward action.
pub struct HasForward<R, E> {
    signature: Signature,
    action: Action<R, E>,
}

/// Type-state builder declaring a step's forward and compensating shapes
/// together.
///
/// The compensating signature is bound to the forward signature when
/// [`compensate`](StepBuilder::compensate) is called, so a compensation that
/// asks for a parameter the forward action never receives fails at
/// registration, not at rollback.
pub struct StepBuilder<R, E, State> {
    name: &'static str,
    state: State,
    _phantom: PhantomData<fn(&mut R) -> E>,
}

impl<R, E> StepBuilder<R, E, NeedsForward> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            state: NeedsForward,
            _phantom: PhantomData,
        }
    }

    /// Declare the forward action and its parameters.
    #[must_use]
    pub fn forward<F>(self, signature: Signature, action: F) -> StepBuilder<R, E, HasForward<R, E>>
    where
        F: Fn(&mut R, &Arguments<'_>) -> Result<(), E> + Send + Sync + 'static,
    {
        StepBuilder {
            name: self.name,
            state: HasForward {
                signature,
                action: Box::new(action),
            },
            _phantom: PhantomData,
        }
    }
}

impl<R, E> StepBuilder<R, E, HasForward<R, E>> {
    /// Declare the compensating action and build the step.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] if the compensating signature names a
    /// parameter the forward signature lacks, or if either repeats a name.
    pub fn compensate<F>(
        self,
        signature: Signature,
        action: F,
    ) -> Result<Arc<Step<R, E>>, BindingError>
    where
        F: Fn(&mut R, &Arguments<'_>) -> Result<(), E> + Send + Sync + 'static,
    {
        let HasForward {
            signature: forward_signature,
            action: forward,
        } = self.state;
        let plan = bind(self.name, &forward_signature, &signature)?;

        Ok(Arc::new(Step::from_parts(
            self.name,
            forward_signature,
            forward,
            signature,
            Box::new(action),
            plan,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestError;

    #[test]
    fn builder_binds_compensation_to_forward() -> anyhow::Result<()> {
        let step: Arc<Step<(), TestError>> = Step::builder("rename_file")
            .forward(Signature::new(["file_name", "new_file_name"]), |(), _| Ok(()))
            .compensate(Signature::new(["new_file_name", "file_name"]), |(), _| {
                Ok(())
            })?;

        assert_eq!(step.name(), "rename_file");
        assert_eq!(step.plan().positional(), [1, 0]);
        Ok(())
    }

    #[test]
    fn builder_fails_fast_on_unknown_compensating_parameter() {
        let result: Result<Arc<Step<(), TestError>>, _> = Step::builder("insert_file")
            .forward(Signature::new(["file_name", "content"]), |(), _| Ok(()))
            .compensate(Signature::new(["path"]), |(), _| Ok(()));

        assert!(matches!(
            result,
            Err(BindingError::UnknownPositional { step, name }) if step == "insert_file" && name == "path"
        ));
    }

    #[test]
    fn builder_keeps_both_signatures() -> anyhow::Result<()> {
        let step: Arc<Step<(), TestError>> = Step::builder("write")
            .forward(
                Signature::new(["path", "body"]).with_default("sync", false),
                |(), _| Ok(()),
            )
            .compensate(
                Signature::new(["path"]).with_default("sync", true),
                |(), _| Ok(()),
            )?;

        assert_eq!(step.forward_signature().required(), ["path", "body"]);
        assert_eq!(step.compensating_signature().required(), ["path"]);
        assert_eq!(step.plan().keyword(), ["sync"]);
        Ok(())
    }
}
