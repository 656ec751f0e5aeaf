use std::time::Instant;

use serde::Serialize;

use crate::args::CallArgs;

/// Which half of a step an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// The forward action ran.
    Forward,
    /// The compensating action ran.
    Compensating,
}

/// One executed action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Forward or compensating.
    pub kind: ActionKind,
    /// Identity of the step.
    pub step: String,
    /// Arguments the action was actually called with. For compensating
    /// entries these are the projected arguments.
    pub args: CallArgs,
    /// When the entry was appended.
    #[serde(skip)]
    pub recorded_at: Instant,
}

impl AuditEntry {
    /// Human readable action name: the step name, prefixed with `de_` for
    /// compensations.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.kind {
            ActionKind::Forward => self.step.clone(),
            ActionKind::Compensating => format!("de_{}", self.step),
        }
    }
}

/// Append-only log of every action a procedure executed.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_forward(&mut self, step: &str, args: CallArgs) {
        self.append(ActionKind::Forward, step, args);
    }

    pub(crate) fn record_compensating(&mut self, step: &str, args: CallArgs) {
        self.append(ActionKind::Compensating, step, args);
    }

    fn append(&mut self, kind: ActionKind, step: &str, args: CallArgs) {
        self.entries.push(AuditEntry {
            kind,
            step: step.to_string(),
            args,
            recorded_at: Instant::now(),
        });
    }

    /// All entries in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn forward_entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries_of(ActionKind::Forward)
    }

    pub fn compensating_entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries_of(ActionKind::Compensating)
    }

    fn entries_of(&self, kind: ActionKind) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Get a summary of the executed actions for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for entry in &self.entries {
            let marker = match entry.kind {
                ActionKind::Forward => "→",
                ActionKind::Compensating => "↩",
            };
            lines.push(format!("{marker} {}({})", entry.display_name(), entry.args));
        }
        lines.join("\n")
    }

    /// Serialize the entries as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}
