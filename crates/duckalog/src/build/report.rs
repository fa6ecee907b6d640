//! Build reports.

use super::state::BuildState;
use std::fmt;

/// Outcome of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Statement executed.
    Created,
    /// Statement failed; the message is scrubbed of credentials.
    Failed(String),
    /// Never attempted because an earlier statement failed.
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Failed(message) => write!(f, "failed: {}", message),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// One named entity and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOutcome {
    /// View (schema-qualified), secret name or attachment alias.
    pub name: String,
    /// What happened.
    pub outcome: Outcome,
}

/// Report of a nested catalog build.
#[derive(Debug, Clone)]
pub struct NestedReport {
    /// Alias the nested catalog is attached under.
    pub alias: String,
    /// The nested build.
    pub report: BuildReport,
}

/// Everything a build did, successful or not.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Target database as given.
    pub target: String,
    /// Fingerprint of the built document.
    pub fingerprint: String,
    /// Last state reached.
    pub state: BuildState,
    /// Setup statements executed.
    pub setup_statements: usize,
    /// Attachments in execution order.
    pub attachments: Vec<EntityOutcome>,
    /// Secrets in declaration order.
    pub secrets: Vec<EntityOutcome>,
    /// Views in declaration order.
    pub views: Vec<EntityOutcome>,
    /// Nested catalog builds triggered by this one.
    pub nested: Vec<NestedReport>,
    /// Total statements executed.
    pub statements_executed: usize,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildReport {
    pub(crate) fn new(target: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            fingerprint: fingerprint.into(),
            ..Default::default()
        }
    }

    /// Check whether the build reached `Done`.
    pub fn is_success(&self) -> bool {
        self.state == BuildState::Done
    }

    /// Views created before the build stopped.
    pub fn created_views(&self) -> Vec<&str> {
        names_with(&self.views, |o| matches!(o, Outcome::Created))
    }

    /// Views never attempted.
    pub fn skipped_views(&self) -> Vec<&str> {
        names_with(&self.views, |o| matches!(o, Outcome::Skipped))
    }

    /// The view whose statement failed, if any.
    pub fn failed_view(&self) -> Option<&str> {
        names_with(&self.views, |o| matches!(o, Outcome::Failed(_)))
            .into_iter()
            .next()
    }

    /// Secrets created before the build stopped.
    pub fn created_secrets(&self) -> Vec<&str> {
        names_with(&self.secrets, |o| matches!(o, Outcome::Created))
    }

    /// Attachments created before the build stopped.
    pub fn created_attachments(&self) -> Vec<&str> {
        names_with(&self.attachments, |o| matches!(o, Outcome::Created))
    }

    /// Look up a nested build by alias.
    pub fn nested(&self, alias: &str) -> Option<&BuildReport> {
        self.nested
            .iter()
            .find(|n| n.alias == alias)
            .map(|n| &n.report)
    }

    pub(crate) fn mark(entries: &mut [EntityOutcome], name: &str, outcome: Outcome) {
        if let Some(entry) = entries.iter_mut().find(|e| e.name == name) {
            entry.outcome = outcome;
        }
    }
}

fn names_with(entries: &[EntityOutcome], pred: impl Fn(&Outcome) -> bool) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| pred(&e.outcome))
        .map(|e| e.name.as_str())
        .collect()
}

pub(crate) fn skipped(names: impl IntoIterator<Item = String>) -> Vec<EntityOutcome> {
    names
        .into_iter()
        .map(|name| EntityOutcome {
            name,
            outcome: Outcome::Skipped,
        })
        .collect()
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "target: {} ({})", self.target, self.state)?;
        for (label, entries) in [
            ("attachment", &self.attachments),
            ("secret", &self.secrets),
            ("view", &self.views),
        ] {
            for entry in entries {
                writeln!(f, "  {} {}: {}", label, entry.name, entry.outcome)?;
            }
        }
        for nested in &self.nested {
            writeln!(f, "  nested {}: {}", nested.alias, nested.report.state)?;
        }
        write!(
            f,
            "{} statements in {} ms",
            self.statements_executed, self.duration_ms
        )
    }
}
