use std::sync::Arc;

use log::{info, warn};

use crate::auth::Token;
use crate::error::{RelayError, Result};
use crate::gitlab::GitLabClient;

/// Obtains a usable pipeline-trigger credential for a project. Tokens are
/// re-resolved on every decision that needs one; nothing is cached across
/// requests.
pub struct TokenResolver {
    client: Arc<GitLabClient>,
    static_token: Option<Token>,
}

impl TokenResolver {
    pub fn new(client: Arc<GitLabClient>, static_token: Option<Token>) -> Self {
        Self {
            client,
            static_token,
        }
    }

    /// Resolve a trigger token for `project_id`.
    ///
    /// A statically configured token wins without any remote calls.
    /// Otherwise the project's existing triggers are searched for a live
    /// one; discovery failure is not fatal and falls through to creating
    /// a fresh trigger, whose failure is.
    pub async fn resolve(&self, project_id: u64) -> Result<Token> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        match self.client.list_triggers(project_id).await {
            Ok(triggers) => {
                for trigger in &triggers {
                    if let Some(value) = trigger.usable_token() {
                        info!(
                            "found existing trigger: id={} description={}",
                            trigger.id,
                            trigger.description.as_deref().unwrap_or("")
                        );
                        return Ok(Token::from(value));
                    }
                }
            }
            Err(err) => warn!("listing triggers for project {project_id} failed: {err}"),
        }

        let created = self.client.create_trigger(project_id).await?;
        info!("created trigger: id={}", created.id);
        match created.usable_token() {
            Some(value) => Ok(Token::from(value)),
            None => Err(RelayError::TokenUnavailable(created.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(server: &mockito::ServerGuard, static_token: Option<Token>) -> TokenResolver {
        let client = Arc::new(GitLabClient::new(&server.url(), None).unwrap());
        TokenResolver::new(client, static_token)
    }

    #[tokio::test]
    async fn static_token_short_circuits_remote_calls() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(&server, Some(Token::from("fixed")));
        let token = resolver.resolve(1).await.unwrap();

        assert_eq!(token.as_str(), "fixed");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn discovery_prefers_first_live_token() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": 1, "token": "old", "deleted_at": "2020-01-01T00:00:00Z"},
                    {"id": 2, "token": "", "deleted_at": null},
                    {"id": 3, "token": "live-token", "deleted_at": null, "description": "ops"}
                ]"#,
            )
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v4/projects/1/triggers")
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(&server, None);
        let token = resolver.resolve(1).await.unwrap();

        assert_eq!(token.as_str(), "live-token");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn creates_trigger_when_discovery_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "token": null, "deleted_at": "2020-01-01T00:00:00Z"}]"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v4/projects/1/triggers")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 9, "token": "minted"}"#)
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server, None);
        let token = resolver.resolve(1).await.unwrap();

        assert_eq!(token.as_str(), "minted");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn discovery_failure_falls_through_to_create() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v4/projects/1/triggers")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 9, "token": "minted"}"#)
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server, None);
        let token = resolver.resolve(1).await.unwrap();

        assert_eq!(token.as_str(), "minted");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn create_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let _create = server
            .mock("POST", "/api/v4/projects/1/triggers")
            .with_status(403)
            .with_body("insufficient permissions")
            .create_async()
            .await;

        let resolver = resolver(&server, None);
        let err = resolver.resolve(1).await.unwrap_err();

        assert!(matches!(err, RelayError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn created_trigger_without_token_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v4/projects/1/triggers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let _create = server
            .mock("POST", "/api/v4/projects/1/triggers")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 9}"#)
            .create_async()
            .await;

        let resolver = resolver(&server, None);
        let err = resolver.resolve(1).await.unwrap_err();

        assert!(matches!(err, RelayError::TokenUnavailable(9)));
    }
}
