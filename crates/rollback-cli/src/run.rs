use std::path::PathBuf;

use rollback_fs::{GenerateDirsWithFiles, Plan, TargetDir};
use rollback_procedure::{AuditLog, ProcedureState, RollbackableProcedure};

use crate::error::{CliError, Result};

pub(crate) struct RunOptions {
    pub(crate) dir: PathBuf,
    pub(crate) plan: Option<PathBuf>,
    pub(crate) fail_after_rename: bool,
    pub(crate) rollback: bool,
    pub(crate) json: bool,
}

/// Run the directory procedure and render its actions log.
pub(crate) fn execute(options: &RunOptions) -> Result<String> {
    let plan = match &options.plan {
        Some(path) => Plan::load(path)?,
        None => Plan::reference(),
    };
    let definition =
        GenerateDirsWithFiles::new(plan)?.with_injected_failure(options.fail_after_rename);
    let mut procedure = RollbackableProcedure::new(definition, TargetDir::new(&options.dir));

    let state = procedure.run()?;
    if state == ProcedureState::Completed && options.rollback {
        procedure.rollback()?;
    }

    if let Some(failure) = procedure.take_last_failure() {
        eprintln!("{}", render(procedure.actions_log(), options.json)?);
        return Err(CliError::RolledBack(failure));
    }

    let mut output = render(procedure.actions_log(), options.json)?;
    if !options.json {
        output.push_str(&format!("\nstate: {}", procedure.state()));
    }
    Ok(output)
}

fn render(log: &AuditLog, json: bool) -> Result<String> {
    if json {
        Ok(log.to_json()?)
    } else {
        Ok(log.summary())
    }
}
