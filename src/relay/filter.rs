use std::fmt;

use super::event::{MergeRequestAction, MergeRequestEvent, MergeRequestState, WebhookPayload, MERGE_REQUEST_KIND};

/// Terminal admission verdict for one event. Reject means the payload is
/// not ours to serve; Skip means it is ours but policy says no build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Skip(SkipReason),
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedKind(String),
    MissingAttributes,
    ForeignHost(String),
    Fork,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind(kind) => write!(f, "unsupported object kind: {kind}"),
            Self::MissingAttributes => write!(f, "missing merge request attributes"),
            Self::ForeignHost(url) => {
                write!(f, "source project {url} is not hosted on the configured GitLab instance")
            }
            Self::Fork => write!(f, "forks are not supported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IgnoredAction(MergeRequestAction),
    MergedDisabled,
    WorkInProgress,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoredAction(action) => write!(f, "ignored merge request action: {action}"),
            Self::MergedDisabled => {
                write!(f, "ignored merged merge request: trigger-merged is disabled")
            }
            Self::WorkInProgress => write!(f, "work in progress, skipping build"),
        }
    }
}

#[derive(Debug)]
pub struct Decision {
    pub admission: Admission,
    /// Whether the remove-source-branch follow-up should run for this
    /// event. Only set when the host and fork checks passed, so a skipped
    /// event may still schedule it but a foreign one never does.
    pub update_remove_source: bool,
}

/// Admission rules for incoming events, built once from the immutable
/// runtime configuration.
pub struct EventFilter {
    base_url_prefix: String,
    trigger_merged: bool,
    remove_source_exceptions: Vec<String>,
}

impl EventFilter {
    pub fn new(
        base_url_prefix: impl Into<String>,
        trigger_merged: bool,
        remove_source_exceptions: Vec<String>,
    ) -> Self {
        Self {
            base_url_prefix: base_url_prefix.into(),
            trigger_merged,
            remove_source_exceptions,
        }
    }

    pub fn evaluate(&self, payload: &WebhookPayload) -> Decision {
        if payload.object_kind != MERGE_REQUEST_KIND {
            return Decision {
                admission: Admission::Reject(RejectReason::UnsupportedKind(
                    payload.object_kind.clone(),
                )),
                update_remove_source: false,
            };
        }

        let Some(event) = &payload.object_attributes else {
            return Decision {
                admission: Admission::Reject(RejectReason::MissingAttributes),
                update_remove_source: false,
            };
        };

        let host_ok = event.source.http_url.starts_with(&self.base_url_prefix);
        let same_project = event.source.http_url == event.target.http_url;

        let update_remove_source = event.action == MergeRequestAction::Open
            && host_ok
            && same_project
            && !self
                .remove_source_exceptions
                .iter()
                .any(|branch| branch == &event.source_branch);

        Decision {
            admission: self.admission(event, host_ok, same_project),
            update_remove_source,
        }
    }

    fn admission(&self, event: &MergeRequestEvent, host_ok: bool, same_project: bool) -> Admission {
        match event.action {
            MergeRequestAction::Open | MergeRequestAction::Reopen | MergeRequestAction::Update => {}
            other => {
                if event.state == MergeRequestState::Merged {
                    if !self.trigger_merged {
                        return Admission::Skip(SkipReason::MergedDisabled);
                    }
                } else {
                    return Admission::Skip(SkipReason::IgnoredAction(other));
                }
            }
        }

        if event.work_in_progress {
            return Admission::Skip(SkipReason::WorkInProgress);
        }

        if !host_ok {
            return Admission::Reject(RejectReason::ForeignHost(event.source.http_url.clone()));
        }

        if !same_project {
            return Admission::Reject(RejectReason::Fork);
        }

        Admission::Admit
    }
}
