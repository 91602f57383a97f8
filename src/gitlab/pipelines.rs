use super::client::GitLabClient;
use super::types::{Job, Pipeline};
use crate::error::Result;

impl GitLabClient {
    /// List running pipelines on a ref, oldest first.
    pub async fn list_running_pipelines(
        &self,
        project_id: u64,
        ref_: &str,
    ) -> Result<Vec<Pipeline>> {
        let mut url = self.endpoint(project_id, "pipelines")?;
        url.query_pairs_mut()
            .append_pair("ref", ref_)
            .append_pair("status", "running")
            .append_pair("sort", "asc");
        self.execute(self.client().get(url)).await
    }

    /// List the jobs of a pipeline that are still pending.
    pub async fn list_pending_jobs(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>> {
        let mut url = self.endpoint(project_id, &format!("pipelines/{pipeline_id}/jobs"))?;
        url.query_pairs_mut().append_pair("scope[]", "pending");
        self.execute(self.client().get(url)).await
    }

    /// Cancel a single job.
    pub async fn cancel_job(&self, project_id: u64, job_id: u64) -> Result<Job> {
        let url = self.endpoint(project_id, &format!("jobs/{job_id}/cancel"))?;
        self.execute(self.client().post(url)).await
    }
}
