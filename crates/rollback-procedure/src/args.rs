use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::ArgumentError;
use crate::signature::Signature;

/// Arguments of one recorded call, receiver excluded.
///
/// Positional values line up with the callee's required parameters; keyword
/// values hold only the defaulted parameters the caller supplied explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl CallArgs {
    /// Create an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an argument list from positional values only.
    #[must_use]
    pub fn from_positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: IndexMap::new(),
        }
    }

    /// Append a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword value.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    #[must_use]
    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }

    pub(crate) fn from_parts(positional: Vec<Value>, keyword: IndexMap<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    /// Check that these arguments can be applied to `signature`.
    pub(crate) fn check_against(&self, signature: &Signature) -> Result<(), ArgumentError> {
        let expected = signature.required().len();
        if self.positional.len() != expected {
            return Err(ArgumentError::Arity {
                expected,
                actual: self.positional.len(),
            });
        }
        if let Some(name) = self
            .keyword
            .keys()
            .find(|name| !signature.defaulted().contains_key(name.as_str()))
        {
            return Err(ArgumentError::UnexpectedKeyword(name.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.positional {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
            first = false;
        }
        for (name, value) in &self.keyword {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Name-resolving view of a call's arguments, handed to actions.
///
/// Lookups go through the action's own signature: required parameters come
/// from their position, defaulted parameters from the supplied keywords and
/// otherwise from the declared default.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    signature: &'a Signature,
    args: &'a CallArgs,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(signature: &'a Signature, args: &'a CallArgs) -> Self {
        Self { signature, args }
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if let Some(index) = self.signature.position(name) {
            return self.args.positional.get(index);
        }
        self.args
            .keyword
            .get(name)
            .or_else(|| self.signature.defaulted().get(name))
    }

    /// Look up a parameter by name, failing if it has no value.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if the name is unknown.
    pub fn value(&self, name: &str) -> Result<&'a Value, ArgumentError> {
        self.get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    /// Look up a string parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if the name is unknown and
    /// [`ArgumentError::Type`] if the value is not a string.
    pub fn str(&self, name: &str) -> Result<&'a str, ArgumentError> {
        self.value(name)?.as_str().ok_or_else(|| ArgumentError::Type {
            name: name.to_string(),
            expected: "a string",
        })
    }

    /// Look up a boolean parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if the name is unknown and
    /// [`ArgumentError::Type`] if the value is not a boolean.
    pub fn bool(&self, name: &str) -> Result<bool, ArgumentError> {
        self.value(name)?.as_bool().ok_or_else(|| ArgumentError::Type {
            name: name.to_string(),
            expected: "a boolean",
        })
    }

    /// The raw recorded arguments.
    #[must_use]
    pub fn call_args(&self) -> &'a CallArgs {
        self.args
    }
}
