//! Reversible filesystem procedure.
//!
//! Creates a directory, fills it with files and renames some of them; every
//! step knows how to undo itself, so a failed run leaves the filesystem as it
//! found it.

mod error;
mod plan;
mod procedure;
mod steps;

pub use error::{FsError, Result};
pub use plan::{FileSpec, Plan, RenameSpec};
pub use procedure::GenerateDirsWithFiles;
pub use steps::{DirSteps, FsStep, TargetDir};
