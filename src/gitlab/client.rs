use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{RelayError, Result};

pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl GitLabClient {
    /// Creates a client rooted at `{base_url}/api/v4/`.
    ///
    /// `token` is the optional account credential; when present every
    /// request carries it as a bearer token. Trigger submissions
    /// authenticate through the trigger token in the form body instead.
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mr-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| RelayError::Config(format!("Invalid base URL: {e}")))?
            .join("api/v4/")
            .map_err(|e| RelayError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to get client
    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Helper to build authenticated requests
    pub(crate) fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Construct a project-scoped endpoint URL
    pub(crate) fn endpoint(&self, project_id: u64, path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("projects/{project_id}/"))
            .and_then(|url| url.join(path))
            .map_err(|e| RelayError::Config(format!("Invalid endpoint URL: {e}")))
    }

    /// Send a request and decode the 2xx JSON body. A non-success status
    /// becomes `RelayError::Api` carrying the upstream status and body.
    pub(crate) async fn execute<T>(&self, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.auth_request(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RelayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_under_api_v4() {
        let client = GitLabClient::new("https://gitlab.example.com/", None).unwrap();
        let url = client.endpoint(42, "repository/commits/abc123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/42/repository/commits/abc123"
        );
    }

    #[test]
    fn endpoint_preserves_instance_path_prefix() {
        let client = GitLabClient::new("https://git.example.com/gitlab/", None).unwrap();
        let url = client.endpoint(7, "triggers").unwrap();
        assert_eq!(
            url.as_str(),
            "https://git.example.com/gitlab/api/v4/projects/7/triggers"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = GitLabClient::new("not a url", None);
        assert!(result.is_err());
    }

    #[test]
    fn non_success_response_surfaces_status_and_body() {
        tokio_test::block_on(async {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/api/v4/projects/1/triggers")
                .with_status(403)
                .with_body("403 Forbidden")
                .create_async()
                .await;

            let client = GitLabClient::new(&server.url(), None).unwrap();
            let result = client.list_triggers(1).await;

            match result {
                Err(RelayError::Api { status, message }) => {
                    assert_eq!(status, 403);
                    assert!(message.contains("Forbidden"));
                }
                other => panic!("expected Api error, got {other:?}"),
            }
        });
    }
}
