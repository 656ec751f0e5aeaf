use std::path::PathBuf;

use rollback_procedure::{ArgumentError, BindingError};
use thiserror::Error;

/// Errors raised by the filesystem procedure and its plan loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FsError {
    /// A step's compensation does not fit its forward action.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// An action was handed arguments it cannot use.
    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    /// Creating the target directory failed, including when it already exists.
    #[error("failed to create directory '{path}'")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing the target directory failed, typically because it is not empty.
    #[error("failed to remove directory '{path}'")]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an inserted file failed.
    #[error("failed to write file '{path}'")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing an inserted file failed.
    #[error("failed to remove file '{path}'")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming a file inside the target directory failed.
    #[error("failed to rename '{from}' to '{to}'")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised on purpose by `raise_here` to exercise rollback.
    #[error("injected failure")]
    Injected,

    /// A compensation found no effect of its forward action to undo.
    #[error("nothing to revert for '{0}'")]
    NothingToRevert(&'static str),

    /// The plan file could not be read.
    #[error("failed to read plan file '{path}'")]
    PlanRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The plan file is not a valid TOML plan.
    #[error("failed to parse plan file '{path}'")]
    PlanParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::path::PathBuf;

    use super::FsError;

    #[test]
    fn rename_error_names_both_paths() {
        let err = FsError::Rename {
            from: PathBuf::from("/tmp/c.txt"),
            to: PathBuf::from("/tmp/d.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        let msg = err.to_string();

        assert!(msg.contains("/tmp/c.txt"));
        assert!(msg.contains("/tmp/d.txt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn argument_error_converts_via_from() {
        let arg_err = rollback_procedure::ArgumentError::Missing("file_name".to_string());

        let err: FsError = arg_err.into();

        assert!(matches!(err, FsError::Arguments(_)));
        assert_eq!(err.to_string(), "missing argument 'file_name'");
    }
}
