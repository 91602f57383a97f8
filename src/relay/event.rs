use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::gitlab::types::Pipeline;

/// The only webhook object kind this relay serves.
pub const MERGE_REQUEST_KIND: &str = "merge_request";

/// One received webhook payload, decoded once per request and never
/// mutated. Payloads of other object kinds decode with empty attributes
/// so the filter can reject them by kind.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object_kind: String,
    #[serde(default)]
    pub object_attributes: Option<MergeRequestEvent>,
}

/// Snapshot of the merge request the event describes.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestEvent {
    pub id: u64,
    pub iid: u64,
    pub source_branch: String,
    pub target_branch: String,
    pub source_project_id: u64,
    #[serde(default)]
    pub state: MergeRequestState,
    #[serde(default)]
    pub action: MergeRequestAction,
    #[serde(default)]
    pub work_in_progress: bool,
    pub source: ProjectRef,
    pub target: ProjectRef,
    pub last_commit: CommitRef,
    #[serde(default)]
    pub merge_status: String,
}

/// A project as seen through its clone URL. Source and target are
/// compared by URL to detect forks.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    pub http_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    Opened,
    Reopened,
    Merged,
    Closed,
    Locked,
    #[serde(other)]
    #[default]
    Unknown,
}

impl MergeRequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Reopened => "reopened",
            Self::Merged => "merged",
            Self::Closed => "closed",
            Self::Locked => "locked",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestAction {
    Open,
    Reopen,
    Update,
    Close,
    Merge,
    Approved,
    #[serde(other)]
    #[default]
    Unknown,
}

impl MergeRequestAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Reopen => "reopen",
            Self::Update => "update",
            Self::Close => "close",
            Self::Merge => "merge",
            Self::Approved => "approved",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MergeRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
