//! Update state types persisted by the state store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known update state of a plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateState {
    /// Local checkout matches its remote tracking branch
    Updated,
    /// Remote tracking branch has commits the checkout lacks
    Behind,
    /// Not tracked, never checked, or invalidated
    #[default]
    Unknown,
}

impl std::fmt::Display for UpdateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateState::Updated => write!(f, "Updated"),
            UpdateState::Behind => write!(f, "Behind"),
            UpdateState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// How a plugin's source is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Git,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Git => write!(f, "git"),
        }
    }
}

/// One plugin's entry in the state store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Plugin id
    pub name: String,

    /// Update state (missing in storage reads as Unknown)
    #[serde(default)]
    pub state: UpdateState,

    /// Source kind, `null` when the plugin is not version-controlled
    #[serde(rename = "type", default)]
    pub source: Option<SourceKind>,

    /// Commits on the remote tracking branch missing locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits_behind: Option<u64>,

    /// When the state was last computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl UpdateRecord {
    /// Record for a plugin with no version control
    pub fn untracked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: UpdateState::Unknown,
            source: None,
            commits_behind: None,
            checked_at: Some(Utc::now()),
        }
    }

    /// Record for a git checkout with a known distance to its remote
    pub fn git(name: impl Into<String>, commits_behind: u64) -> Self {
        let state = if commits_behind > 0 {
            UpdateState::Behind
        } else {
            UpdateState::Updated
        };

        Self {
            name: name.into(),
            state,
            source: Some(SourceKind::Git),
            commits_behind: Some(commits_behind),
            checked_at: Some(Utc::now()),
        }
    }
}
