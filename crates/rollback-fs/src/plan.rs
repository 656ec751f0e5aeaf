use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};

/// File to insert into the target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSpec {
    pub name: String,
    pub content: String,
}

/// Rename applied after all files are inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameSpec {
    pub from: String,
    pub to: String,
}

/// What [`GenerateDirsWithFiles`](crate::GenerateDirsWithFiles) creates.
///
/// ```toml
/// files = [{ name = "a.txt", content = "Hello a" }]
/// renames = [{ from = "a.txt", to = "b.txt" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default)]
    pub renames: Vec<RenameSpec>,
}

impl Plan {
    /// Files `a.txt`, `b.txt` and `c.txt`, then `c.txt` renamed to `d.txt`.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            files: ["a", "b", "c"]
                .into_iter()
                .map(|stem| FileSpec {
                    name: format!("{stem}.txt"),
                    content: format!("Hello {stem}"),
                })
                .collect(),
            renames: vec![RenameSpec {
                from: "c.txt".to_string(),
                to: "d.txt".to_string(),
            }],
        }
    }

    /// Read a plan from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::PlanRead`] if the file cannot be read and
    /// [`FsError::PlanParse`] if it is not a valid plan.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FsError::PlanRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| FsError::PlanParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
