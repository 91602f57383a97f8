use serde::Deserialize;

/// A pipeline as returned by the REST API. Only the id is relevant: it is
/// the correlation key between commits, trigger responses and the
/// cancellation sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub last_pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
}

/// A pipeline trigger registered on a project. `deleted_at` is the
/// soft-deletion marker; a usable trigger has it unset and a non-empty
/// token value.
#[derive(Debug, Clone, Deserialize)]
pub struct Trigger {
    pub id: u64,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl Trigger {
    /// A trigger is usable when it is not soft-deleted and the API exposed
    /// a non-empty token value for it.
    pub fn usable_token(&self) -> Option<&str> {
        if self.deleted_at.as_deref().is_some_and(|d| !d.is_empty()) {
            return None;
        }
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Merge request flags relevant to the remove-source-branch follow-up.
/// The API reports null for unset flags, hence the Options.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub should_remove_source_branch: Option<bool>,
    #[serde(default)]
    pub force_remove_source_branch: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_token_requires_live_and_non_empty() {
        let live = Trigger {
            id: 1,
            token: Some("tok".into()),
            description: None,
            deleted_at: None,
        };
        assert_eq!(live.usable_token(), Some("tok"));

        let deleted = Trigger {
            deleted_at: Some("2020-01-01T00:00:00Z".into()),
            ..live.clone()
        };
        assert_eq!(deleted.usable_token(), None);

        let empty = Trigger {
            token: Some(String::new()),
            ..live.clone()
        };
        assert_eq!(empty.usable_token(), None);

        let masked = Trigger {
            token: None,
            ..live
        };
        assert_eq!(masked.usable_token(), None);
    }

    #[test]
    fn commit_with_null_pipeline_deserializes() {
        let commit: Commit =
            serde_json::from_str(r#"{"id": "abc123", "last_pipeline": null}"#).unwrap();
        assert!(commit.last_pipeline.is_none());

        let commit: Commit = serde_json::from_str(
            r#"{"id": "abc123", "last_pipeline": {"id": 77, "status": "running"}}"#,
        )
        .unwrap();
        assert_eq!(commit.last_pipeline.unwrap().id, 77);
    }

    #[test]
    fn merge_request_null_flags_deserialize() {
        let mr: MergeRequest = serde_json::from_str(
            r#"{"should_remove_source_branch": null, "force_remove_source_branch": true}"#,
        )
        .unwrap();
        assert_eq!(mr.should_remove_source_branch, None);
        assert_eq!(mr.force_remove_source_branch, Some(true));
    }
}
