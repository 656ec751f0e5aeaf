use rollback_procedure::{CallArgs, Context, ForwardActionError, Procedure};

use crate::error::{FsError, Result};
use crate::plan::Plan;
use crate::steps::{DirSteps, TargetDir};

/// Creates a directory, inserts files into it and renames some of them.
///
/// With `inject_failure` set, a step that fails without any effect runs
/// after the renames, which rolls everything back.
#[derive(Debug)]
pub struct GenerateDirsWithFiles {
    steps: DirSteps,
    plan: Plan,
    inject_failure: bool,
}

impl GenerateDirsWithFiles {
    /// # Errors
    ///
    /// Returns [`FsError::Binding`] if the steps cannot be bound.
    pub fn new(plan: Plan) -> Result<Self> {
        Ok(Self {
            steps: DirSteps::new()?,
            plan,
            inject_failure: false,
        })
    }

    #[must_use]
    pub fn with_injected_failure(mut self, inject_failure: bool) -> Self {
        self.inject_failure = inject_failure;
        self
    }

    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    #[must_use]
    pub fn steps(&self) -> &DirSteps {
        &self.steps
    }
}

impl Procedure for GenerateDirsWithFiles {
    type Receiver = TargetDir;
    type Error = FsError;

    fn perform(
        &self,
        ctx: &mut Context<'_, Self::Receiver, Self::Error>,
    ) -> std::result::Result<(), ForwardActionError<Self::Error>> {
        ctx.invoke(&self.steps.create_dir, CallArgs::new())?;
        for file in &self.plan.files {
            ctx.invoke(
                &self.steps.insert_file,
                CallArgs::new()
                    .arg(file.name.as_str())
                    .arg(file.content.as_str()),
            )?;
        }
        for rename in &self.plan.renames {
            ctx.invoke(
                &self.steps.rename_file,
                CallArgs::new()
                    .arg(rename.from.as_str())
                    .arg(rename.to.as_str()),
            )?;
        }
        if self.inject_failure {
            ctx.invoke(&self.steps.raise_here, CallArgs::new())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_is_named_after_its_type() -> anyhow::Result<()> {
        let procedure = GenerateDirsWithFiles::new(Plan::reference())?;

        assert_eq!(procedure.name(), "GenerateDirsWithFiles");
        Ok(())
    }

    #[test]
    fn failure_injection_is_off_by_default() -> anyhow::Result<()> {
        let procedure = GenerateDirsWithFiles::new(Plan::default())?;

        assert!(!procedure.inject_failure);
        assert!(procedure.with_injected_failure(true).inject_failure);
        Ok(())
    }
}
