use super::client::GitLabClient;
use super::types::MergeRequest;
use crate::error::Result;

impl GitLabClient {
    /// Fetch a merge request's flags by project id and project-local iid.
    pub async fn get_merge_request(&self, project_id: u64, mr_iid: u64) -> Result<MergeRequest> {
        let url = self.endpoint(project_id, &format!("merge_requests/{mr_iid}"))?;
        self.execute(self.client().get(url)).await
    }

    /// Mark the merge request's source branch for removal on merge.
    pub async fn set_remove_source_branch(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> Result<MergeRequest> {
        let mut url = self.endpoint(project_id, &format!("merge_requests/{mr_iid}"))?;
        url.query_pairs_mut()
            .append_pair("remove_source_branch", "true");
        self.execute(self.client().put(url)).await
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    #[tokio::test]
    async fn set_remove_source_branch_puts_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v4/projects/8/merge_requests/15")
            .match_query(Matcher::UrlEncoded(
                "remove_source_branch".into(),
                "true".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"should_remove_source_branch": true, "force_remove_source_branch": false}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let mr = client.set_remove_source_branch(8, 15).await.unwrap();

        assert_eq!(mr.should_remove_source_branch, Some(true));
        mock.assert_async().await;
    }
}
