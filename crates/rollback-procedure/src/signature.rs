use indexmap::IndexMap;
use serde_json::Value;

/// Parameter shape of an action: required names in declaration order and
/// defaulted names with their defaults.
///
/// The receiver is implicit and never listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    required: Vec<String>,
    defaulted: IndexMap<String, Value>,
}

impl Signature {
    /// Create a signature with the given required parameters.
    #[must_use]
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            defaulted: IndexMap::new(),
        }
    }

    /// A signature with no parameters besides the receiver.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Declare a keyword parameter with a default value.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.defaulted.insert(name.into(), default.into());
        self
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    #[must_use]
    pub fn defaulted(&self) -> &IndexMap<String, Value> {
        &self.defaulted
    }

    /// Position of a required parameter.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.required.iter().position(|param| param == name)
    }

    /// First name that appears twice among the required parameters or in
    /// both the required and the defaulted parameters.
    pub(crate) fn duplicate(&self) -> Option<&str> {
        self.required.iter().enumerate().find_map(|(index, name)| {
            let repeated = self.required[..index].contains(name);
            (repeated || self.defaulted.contains_key(name.as_str())).then_some(name.as_str())
        })
    }
}
