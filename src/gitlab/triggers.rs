use indexmap::IndexMap;

use super::client::GitLabClient;
use super::types::{Pipeline, Trigger};
use crate::auth::Token;
use crate::error::Result;

/// Description attached to triggers this relay creates on demand.
pub const AUTO_TRIGGER_DESCRIPTION: &str = "merge request trigger (created automatically)";

impl GitLabClient {
    /// List the pipeline triggers registered on a project.
    pub async fn list_triggers(&self, project_id: u64) -> Result<Vec<Trigger>> {
        let url = self.endpoint(project_id, "triggers")?;
        self.execute(self.client().get(url)).await
    }

    /// Register a new pipeline trigger on a project.
    pub async fn create_trigger(&self, project_id: u64) -> Result<Trigger> {
        let url = self.endpoint(project_id, "triggers")?;
        let body = serde_json::json!({ "description": AUTO_TRIGGER_DESCRIPTION });
        self.execute(self.client().post(url).json(&body)).await
    }

    /// Submit a pipeline trigger request for `ref_`.
    ///
    /// The trigger token and ref travel in the form body together with the
    /// `variables[...]` set; `variables` iterates in insertion order so the
    /// submitted form matches what the caller logged.
    pub async fn trigger_pipeline(
        &self,
        project_id: u64,
        ref_: &str,
        token: &Token,
        variables: &IndexMap<String, String>,
    ) -> Result<Pipeline> {
        let url = self.endpoint(project_id, "trigger/pipeline")?;

        let mut form: IndexMap<String, String> = IndexMap::with_capacity(variables.len() + 2);
        form.insert("token".to_string(), token.as_str().to_string());
        form.insert("ref".to_string(), ref_.to_string());
        for (name, value) in variables {
            form.insert(format!("variables[{name}]"), value.clone());
        }

        self.execute(self.client().post(url).form(&form)).await
    }
}
