use std::sync::Arc;

use indexmap::IndexMap;
use log::info;

use super::event::{MergeRequestEvent, MergeRequestState};
use crate::auth::Token;
use crate::error::Result;
use crate::gitlab::types::Pipeline;
use crate::gitlab::GitLabClient;

/// The ref a pipeline for this event builds: the target branch once the
/// merge request is merged (the change already landed there), the source
/// branch otherwise.
pub fn pipeline_ref(event: &MergeRequestEvent) -> &str {
    if event.state == MergeRequestState::Merged {
        &event.target_branch
    } else {
        &event.source_branch
    }
}

/// Variable set passed to triggered pipelines. Consumers' build scripts
/// key off these exact names; every entry is always present.
fn variables(event: &MergeRequestEvent) -> IndexMap<String, String> {
    let mut vars = IndexMap::new();
    vars.insert("CI_MERGE_REQUEST".into(), "true".into());
    vars.insert("CI_MERGE_REQUEST_ID".into(), event.id.to_string());
    vars.insert("CI_MERGE_REQUEST_IID".into(), event.iid.to_string());
    vars.insert("CI_MERGE_REQUEST_ACTION".into(), event.action.to_string());
    vars.insert("CI_MERGE_REQUEST_STATE".into(), event.state.to_string());
    vars.insert(
        "CI_MERGE_REQUEST_PROJECT_URL".into(),
        event.target.http_url.clone(),
    );
    vars.insert(
        "CI_MERGE_REQUEST_TARGET_BRANCH".into(),
        event.target_branch.clone(),
    );
    vars
}

/// Builds and submits the trigger request for an admitted event.
pub struct PipelineTrigger {
    client: Arc<GitLabClient>,
}

impl PipelineTrigger {
    pub fn new(client: Arc<GitLabClient>) -> Self {
        Self { client }
    }

    pub async fn run(&self, event: &MergeRequestEvent, token: &Token) -> Result<Pipeline> {
        let ref_ = pipeline_ref(event);
        info!(
            "triggering pipeline: project={} ref={}",
            event.source_project_id, ref_
        );
        self.client
            .trigger_pipeline(event.source_project_id, ref_, token, &variables(event))
            .await
    }
}
