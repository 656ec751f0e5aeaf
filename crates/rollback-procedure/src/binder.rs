use indexmap::IndexMap;

use crate::args::CallArgs;
use crate::error::{ArgumentError, BindingError};
use crate::signature::Signature;

/// Precomputed mapping from a forward call's arguments to the arguments of
/// its compensation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionPlan {
    positional: Vec<usize>,
    keyword: Vec<String>,
}

impl ProjectionPlan {
    /// For each compensating positional parameter, in the compensation's
    /// declared order, the index of the same name in the forward call.
    #[must_use]
    pub fn positional(&self) -> &[usize] {
        &self.positional
    }

    /// Keyword names passed through from the forward call.
    #[must_use]
    pub fn keyword(&self) -> &[String] {
        &self.keyword
    }

    /// Derive compensating arguments from a recorded forward call.
    ///
    /// Keywords the forward caller did not supply are left out so the
    /// compensation's own default applies.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Arity`] if the recorded call is missing a
    /// positional value the compensation needs, which happens when the
    /// forward call itself was rejected.
    pub fn project(&self, forward: &CallArgs) -> Result<CallArgs, ArgumentError> {
        let positional = self
            .positional
            .iter()
            .map(|&index| {
                forward
                    .positional()
                    .get(index)
                    .cloned()
                    .ok_or(ArgumentError::Arity {
                        expected: index + 1,
                        actual: forward.positional().len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let keyword: IndexMap<_, _> = self
            .keyword
            .iter()
            .filter_map(|name| {
                forward
                    .keyword()
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect();
        Ok(CallArgs::from_parts(positional, keyword))
    }
}

/// Bind a compensating signature to a forward signature.
///
/// Every compensating parameter must exist in the forward signature with the
/// same kind (required or defaulted). The compensation may drop parameters
/// and may list required ones in a different order.
///
/// # Errors
///
/// Returns [`BindingError`] if either signature repeats a name or if the
/// compensation declares a name the forward action does not have.
pub fn bind(
    step: &str,
    forward: &Signature,
    compensating: &Signature,
) -> Result<ProjectionPlan, BindingError> {
    for signature in [forward, compensating] {
        if let Some(name) = signature.duplicate() {
            return Err(BindingError::DuplicateParameter {
                step: step.to_string(),
                name: name.to_string(),
            });
        }
    }

    let positional = compensating
        .required()
        .iter()
        .map(|name| {
            forward
                .position(name)
                .ok_or_else(|| BindingError::UnknownPositional {
                    step: step.to_string(),
                    name: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let keyword = compensating
        .defaulted()
        .keys()
        .map(|name| {
            if forward.defaulted().contains_key(name.as_str()) {
                Ok(name.clone())
            } else {
                Err(BindingError::UnknownKeyword {
                    step: step.to_string(),
                    name: name.clone(),
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProjectionPlan {
        positional,
        keyword,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bind_maps_subset_of_required_parameters() -> anyhow::Result<()> {
        let forward = Signature::new(["file_name", "content"]);
        let compensating = Signature::new(["file_name"]);

        let plan = bind("insert_file", &forward, &compensating)?;

        assert_eq!(plan.positional(), [0]);
        Ok(())
    }

    #[test]
    fn bind_follows_compensating_declaration_order() -> anyhow::Result<()> {
        let forward = Signature::new(["file_name", "new_file_name"]);
        let compensating = Signature::new(["new_file_name", "file_name"]);

        let plan = bind("rename_file", &forward, &compensating)?;

        assert_eq!(plan.positional(), [1, 0]);
        Ok(())
    }

    #[test]
    fn bind_empty_compensation_projects_nothing() -> anyhow::Result<()> {
        let forward = Signature::new(["a", "b"]).with_default("c", 1);

        let plan = bind("step", &forward, &Signature::empty())?;

        assert!(plan.positional().is_empty());
        assert!(plan.keyword().is_empty());
        Ok(())
    }

    #[test]
    fn bind_rejects_unknown_positional_name() {
        let forward = Signature::new(["file_name", "content"]);
        let compensating = Signature::new(["path"]);

        let err = bind("insert_file", &forward, &compensating).expect_err("should fail");

        assert_eq!(
            err,
            BindingError::UnknownPositional {
                step: "insert_file".to_string(),
                name: "path".to_string(),
            }
        );
    }

    #[test]
    fn bind_rejects_keyword_that_is_required_in_forward() {
        let forward = Signature::new(["file_name", "mode"]);
        let compensating = Signature::empty().with_default("mode", "w");

        let err = bind("insert_file", &forward, &compensating).expect_err("should fail");

        assert!(matches!(err, BindingError::UnknownKeyword { name, .. } if name == "mode"));
    }

    #[test]
    fn bind_rejects_positional_that_is_defaulted_in_forward() {
        let forward = Signature::new(["file_name"]).with_default("mode", "w");
        let compensating = Signature::new(["mode"]);

        let err = bind("insert_file", &forward, &compensating).expect_err("should fail");

        assert!(matches!(err, BindingError::UnknownPositional { name, .. } if name == "mode"));
    }

    #[test]
    fn bind_rejects_duplicate_names() {
        let forward = Signature::new(["a"]).with_default("a", 1);

        let err = bind("step", &forward, &Signature::empty()).expect_err("should fail");

        assert!(matches!(err, BindingError::DuplicateParameter { name, .. } if name == "a"));
    }

    #[test]
    fn project_drops_and_reorders_positional_values() -> anyhow::Result<()> {
        let forward = Signature::new(["src", "dst", "note"]);
        let compensating = Signature::new(["dst", "src"]);
        let plan = bind("rename", &forward, &compensating)?;

        let projected = plan.project(&CallArgs::from_positional(["c.txt", "d.txt", "why"]))?;

        assert_eq!(projected, CallArgs::from_positional(["d.txt", "c.txt"]));
        Ok(())
    }

    #[test]
    fn project_passes_only_supplied_shared_keywords() -> anyhow::Result<()> {
        let forward = Signature::new(["path"])
            .with_default("force", false)
            .with_default("verbose", false)
            .with_default("mode", "w");
        let compensating = Signature::new(["path"])
            .with_default("force", true)
            .with_default("verbose", false);
        let plan = bind("write", &forward, &compensating)?;

        let forward_args = CallArgs::from_positional(["x"])
            .kwarg("force", false)
            .kwarg("mode", "a");
        let projected = plan.project(&forward_args)?;

        assert_eq!(projected.positional(), [json!("x")]);
        assert_eq!(projected.keyword().len(), 1);
        assert_eq!(projected.keyword().get("force"), Some(&json!(false)));
        Ok(())
    }

    #[test]
    fn project_fails_when_recorded_call_is_short() -> anyhow::Result<()> {
        let forward = Signature::new(["src", "dst"]);
        let compensating = Signature::new(["dst", "src"]);
        let plan = bind("rename", &forward, &compensating)?;

        let err = plan
            .project(&CallArgs::from_positional(["c.txt"]))
            .expect_err("dst was never recorded");

        assert_eq!(
            err,
            ArgumentError::Arity {
                expected: 2,
                actual: 1,
            }
        );
        Ok(())
    }
}
