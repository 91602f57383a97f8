use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::info;

use super::filter::{RejectReason, SkipReason};
use crate::error::RelayError;

/// Terminal result of one decision flow. Exactly one outcome is produced
/// per event; the HTTP status communicates it to the delivering platform.
#[derive(Debug)]
pub enum Outcome {
    Rejected(RejectReason),
    Skipped(SkipReason),
    AlreadyPipelined { commit: String, pipeline: u64 },
    Created { pipeline: u64 },
    Failed(RelayError),
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(RejectReason::UnsupportedKind(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected(RejectReason::MissingAttributes) => StatusCode::BAD_REQUEST,
            Self::Rejected(RejectReason::ForeignHost(_)) => StatusCode::NOT_FOUND,
            Self::Rejected(RejectReason::Fork) => StatusCode::BAD_REQUEST,
            Self::Skipped(SkipReason::WorkInProgress) => StatusCode::ACCEPTED,
            Self::Skipped(_) => StatusCode::NON_AUTHORITATIVE_INFORMATION,
            Self::AlreadyPipelined { .. } => StatusCode::OK,
            Self::Created { .. } => StatusCode::CREATED,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Rejected(reason) => reason.to_string(),
            Self::Skipped(reason) => reason.to_string(),
            Self::AlreadyPipelined { commit, pipeline } => {
                format!("commit {commit} already has pipeline {pipeline}")
            }
            Self::Created { pipeline } => format!("created pipeline {pipeline}"),
            Self::Failed(err) => format!("internal error: {err}"),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        info!("response {}: {message}", status.as_u16());
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::event::MergeRequestAction;

    #[test]
    fn statuses_follow_the_outcome_table() {
        assert_eq!(
            Outcome::Rejected(RejectReason::UnsupportedKind("push".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Outcome::Rejected(RejectReason::Fork).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Outcome::Rejected(RejectReason::ForeignHost("https://x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Outcome::Skipped(SkipReason::IgnoredAction(MergeRequestAction::Close)).status(),
            StatusCode::NON_AUTHORITATIVE_INFORMATION
        );
        assert_eq!(
            Outcome::Skipped(SkipReason::MergedDisabled).status(),
            StatusCode::NON_AUTHORITATIVE_INFORMATION
        );
        assert_eq!(
            Outcome::Skipped(SkipReason::WorkInProgress).status(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            Outcome::AlreadyPipelined {
                commit: "abc".into(),
                pipeline: 1
            }
            .status(),
            StatusCode::OK
        );
        assert_eq!(Outcome::Created { pipeline: 1 }.status(), StatusCode::CREATED);
        assert_eq!(
            Outcome::Failed(RelayError::TokenUnavailable(1)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_reference_contract_identifiers_only() {
        let outcome = Outcome::AlreadyPipelined {
            commit: "deadbeef".into(),
            pipeline: 42,
        };
        assert_eq!(outcome.message(), "commit deadbeef already has pipeline 42");

        let outcome = Outcome::Created { pipeline: 314 };
        assert_eq!(outcome.message(), "created pipeline 314");
    }
}
