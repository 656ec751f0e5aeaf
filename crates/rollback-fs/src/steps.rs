use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollback_procedure::{Signature, Step};
use tracing::debug;

use crate::error::{FsError, Result};

/// Directory every filesystem step operates in.
///
/// Remembers whether `create_dir` made the directory, so its compensation
/// never removes a directory that existed beforehand.
#[derive(Debug, Clone)]
pub struct TargetDir {
    root: PathBuf,
    created: bool,
}

impl TargetDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: false,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn full_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

pub type FsStep = Arc<Step<TargetDir, FsError>>;

/// The reversible filesystem steps, bound once per procedure definition.
#[derive(Debug, Clone)]
pub struct DirSteps {
    pub create_dir: FsStep,
    pub insert_file: FsStep,
    pub rename_file: FsStep,
    pub raise_here: FsStep,
}

impl DirSteps {
    /// Bind every step.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Binding`] if a compensation does not fit its
    /// forward action.
    pub fn new() -> Result<Self> {
        Ok(Self {
            create_dir: create_dir()?,
            insert_file: insert_file()?,
            rename_file: rename_file()?,
            raise_here: raise_here()?,
        })
    }
}

fn create_dir() -> Result<FsStep> {
    let step = Step::<TargetDir, FsError>::builder("create_dir")
        .forward(Signature::empty(), |dir, _| {
            fs::create_dir(dir.root()).map_err(|source| FsError::CreateDir {
                path: dir.root().to_path_buf(),
                source,
            })?;
            dir.created = true;
            debug!(path = %dir.root().display(), "created directory");
            Ok(())
        })
        .compensate(Signature::empty(), |dir, _| {
            if !dir.created {
                return Err(FsError::NothingToRevert("create_dir"));
            }
            debug!(path = %dir.root().display(), "removing directory");
            fs::remove_dir(dir.root()).map_err(|source| FsError::RemoveDir {
                path: dir.root().to_path_buf(),
                source,
            })?;
            dir.created = false;
            Ok(())
        })?;
    Ok(step)
}

fn insert_file() -> Result<FsStep> {
    let step = Step::<TargetDir, FsError>::builder("insert_file")
        .forward(Signature::new(["file_name", "content"]), |dir, args| {
            let path = dir.full_path(args.str("file_name")?);
            let content = args.str("content")?;
            fs::write(&path, content).map_err(|source| FsError::WriteFile {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), bytes = content.len(), "inserted file");
            Ok(())
        })
        .compensate(Signature::new(["file_name"]), |dir, args| {
            let path = dir.full_path(args.str("file_name")?);
            debug!(path = %path.display(), "removing file");
            fs::remove_file(&path).map_err(|source| FsError::RemoveFile { path, source })
        })?;
    Ok(step)
}

fn rename_file() -> Result<FsStep> {
    // The compensation lists its parameters in the opposite order.
    let step = Step::<TargetDir, FsError>::builder("rename_file")
        .forward(
            Signature::new(["file_name", "new_file_name"]),
            |dir, args| {
                let from = dir.full_path(args.str("file_name")?);
                let to = dir.full_path(args.str("new_file_name")?);
                rename(&from, &to)
            },
        )
        .compensate(
            Signature::new(["new_file_name", "file_name"]),
            |dir, args| {
                let from = dir.full_path(args.str("new_file_name")?);
                let to = dir.full_path(args.str("file_name")?);
                rename(&from, &to)
            },
        )?;
    Ok(step)
}

fn raise_here() -> Result<FsStep> {
    let step = Step::<TargetDir, FsError>::builder("raise_here")
        .forward(Signature::empty(), |_, _| Err(FsError::Injected))
        .compensate(Signature::empty(), |_, _| {
            Err(FsError::NothingToRevert("raise_here"))
        })?;
    Ok(step)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| FsError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    debug!(from = %from.display(), to = %to.display(), "renamed file");
    Ok(())
}
