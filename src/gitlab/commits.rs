use super::client::GitLabClient;
use super::types::Commit;
use crate::error::Result;

impl GitLabClient {
    /// Fetch a single commit, including its currently associated pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the commit does not exist.
    pub async fn get_commit(&self, project_id: u64, sha: &str) -> Result<Commit> {
        let url = self.endpoint(project_id, &format!("repository/commits/{sha}"))?;
        self.execute(self.client().get(url)).await
    }
}
