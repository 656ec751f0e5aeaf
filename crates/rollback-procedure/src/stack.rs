use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::args::CallArgs;
use crate::step::Step;

/// One recorded forward invocation: the step and the exact arguments it was
/// called with.
pub struct Frame<R, E> {
    step: Arc<Step<R, E>>,
    args: CallArgs,
}

impl<R, E> Frame<R, E> {
    pub(crate) fn new(step: Arc<Step<R, E>>, args: CallArgs) -> Self {
        Self { step, args }
    }

    #[must_use]
    pub fn step(&self) -> &Arc<Step<R, E>> {
        &self.step
    }

    #[must_use]
    pub fn args(&self) -> &CallArgs {
        &self.args
    }
}

impl<R, E> Debug for Frame<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("step", &self.step.name())
            .field("args", &self.args)
            .finish()
    }
}

/// LIFO record of forward invocations awaiting compensation.
pub struct ExecutionStack<R, E> {
    frames: Vec<Frame<R, E>>,
}

impl<R, E> ExecutionStack<R, E> {
    #[must_use]
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub(crate) fn push(&mut self, frame: Frame<R, E>) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<R, E>> {
        self.frames.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the most recent to the oldest, i.e. in rollback order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame<R, E>> {
        self.frames.iter().rev()
    }
}

impl<R, E> Default for ExecutionStack<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> Debug for ExecutionStack<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}
