//! Build state machine.

use std::fmt;

/// Phase of a catalog build.
///
/// A build moves forward one phase at a time. `Failed` is reachable from
/// any non-terminal state; `Done` only from `ViewsMaterialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildState {
    /// Nothing has happened yet.
    #[default]
    Init,
    /// A session is open against the target.
    SessionOpen,
    /// Extensions, pragmas and settings are applied.
    SettingsApplied,
    /// All attachments, nested catalogs included, are attached.
    AttachmentsReady,
    /// All secrets exist.
    SecretsReady,
    /// All views exist.
    ViewsMaterialized,
    /// Build finished and the session is closed.
    Done,
    /// Build stopped.
    Failed,
}

impl BuildState {
    /// Check whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }

    /// The state that follows on success.
    pub fn next(&self) -> Option<BuildState> {
        match self {
            BuildState::Init => Some(BuildState::SessionOpen),
            BuildState::SessionOpen => Some(BuildState::SettingsApplied),
            BuildState::SettingsApplied => Some(BuildState::AttachmentsReady),
            BuildState::AttachmentsReady => Some(BuildState::SecretsReady),
            BuildState::SecretsReady => Some(BuildState::ViewsMaterialized),
            BuildState::ViewsMaterialized => Some(BuildState::Done),
            BuildState::Done | BuildState::Failed => None,
        }
    }

    /// Check whether moving to `to` is allowed.
    pub fn can_transition_to(&self, to: BuildState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == BuildState::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildState::Init => write!(f, "init"),
            BuildState::SessionOpen => write!(f, "session_open"),
            BuildState::SettingsApplied => write!(f, "settings_applied"),
            BuildState::AttachmentsReady => write!(f, "attachments_ready"),
            BuildState::SecretsReady => write!(f, "secrets_ready"),
            BuildState::ViewsMaterialized => write!(f, "views_materialized"),
            BuildState::Done => write!(f, "done"),
            BuildState::Failed => write!(f, "failed"),
        }
    }
}
