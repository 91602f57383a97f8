use std::sync::Arc;

use log::{debug, error, info};

use super::cancel::Canceller;
use super::event::WebhookPayload;
use super::filter::{Admission, EventFilter, RejectReason};
use super::outcome::Outcome;
use super::token::TokenResolver;
use super::trigger::{pipeline_ref, PipelineTrigger};
use crate::config::Config;
use crate::error::Result;
use crate::gitlab::GitLabClient;

/// Deferred best-effort work attached to an outcome. The transport spawns
/// it after the response has been produced; nothing in it may change the
/// already-reported result.
#[derive(Debug, Default)]
pub struct FollowUps {
    pub cancel: Option<CancelSweep>,
    pub remove_source: Option<RemoveSourceBranch>,
}

/// Cancel still-pending work on `ref_` superseded by `exclude_pipeline`,
/// which is always exactly the pipeline this event created or discovered.
#[derive(Debug, PartialEq, Eq)]
pub struct CancelSweep {
    pub project_id: u64,
    pub ref_: String,
    pub exclude_pipeline: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RemoveSourceBranch {
    pub project_id: u64,
    pub mr_iid: u64,
}

/// The orchestrator: composes filter, idempotency guard, token resolver,
/// trigger and canceller into the decision flow for one event. Cheap to
/// clone; all state behind the `Arc` is immutable.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    client: Arc<GitLabClient>,
    filter: EventFilter,
    resolver: TokenResolver,
    trigger: PipelineTrigger,
    canceller: Canceller,
}

impl Relay {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Arc::new(GitLabClient::new(
            config.base_url.as_str(),
            config.credentials.account_token().cloned(),
        )?);

        Ok(Self {
            inner: Arc::new(RelayInner {
                filter: EventFilter::new(
                    config.base_url.as_str(),
                    config.trigger_merged,
                    config.remove_source_exceptions.clone(),
                ),
                resolver: TokenResolver::new(
                    Arc::clone(&client),
                    config.credentials.static_trigger().cloned(),
                ),
                trigger: PipelineTrigger::new(Arc::clone(&client)),
                canceller: Canceller::new(Arc::clone(&client)),
                client,
            }),
        })
    }

    /// Run the decision flow for one event: filter, idempotency guard,
    /// token resolution, trigger. Returns the terminal outcome together
    /// with the follow-up work the caller should spawn after responding.
    pub async fn handle(&self, payload: WebhookPayload) -> (Outcome, FollowUps) {
        let mut follow_ups = FollowUps::default();

        if let Some(event) = &payload.object_attributes {
            info!(
                "merge request event: state={} action={} id={} iid={} project={} \
                 branches={}>{} commit={}@{} known_pipeline={:?} wip={} merge_status={}",
                event.state,
                event.action,
                event.id,
                event.iid,
                event.source.http_url,
                event.source_branch,
                event.target_branch,
                event.last_commit.id,
                event
                    .last_commit
                    .timestamp
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                event.last_commit.last_pipeline.as_ref().map(|p| p.id),
                event.work_in_progress,
                event.merge_status,
            );
        }

        let decision = self.inner.filter.evaluate(&payload);
        if decision.update_remove_source {
            if let Some(event) = &payload.object_attributes {
                follow_ups.remove_source = Some(RemoveSourceBranch {
                    project_id: event.source_project_id,
                    mr_iid: event.iid,
                });
            }
        }

        match decision.admission {
            Admission::Reject(reason) => return (Outcome::Rejected(reason), follow_ups),
            Admission::Skip(reason) => return (Outcome::Skipped(reason), follow_ups),
            Admission::Admit => {}
        }

        let Some(event) = &payload.object_attributes else {
            // the filter admits only payloads with attributes
            return (Outcome::Rejected(RejectReason::MissingAttributes), follow_ups);
        };

        let ref_ = pipeline_ref(event).to_string();

        let commit = match self
            .inner
            .client
            .get_commit(event.source_project_id, &event.last_commit.id)
            .await
        {
            Ok(commit) => commit,
            Err(err) => return (Outcome::Failed(err), follow_ups),
        };

        if let Some(existing) = commit.last_pipeline {
            follow_ups.cancel = Some(CancelSweep {
                project_id: event.source_project_id,
                ref_,
                exclude_pipeline: existing.id,
            });
            return (
                Outcome::AlreadyPipelined {
                    commit: commit.id,
                    pipeline: existing.id,
                },
                follow_ups,
            );
        }

        let token = match self.inner.resolver.resolve(event.source_project_id).await {
            Ok(token) => token,
            Err(err) => return (Outcome::Failed(err), follow_ups),
        };

        let pipeline = match self.inner.trigger.run(event, &token).await {
            Ok(pipeline) => pipeline,
            Err(err) => return (Outcome::Failed(err), follow_ups),
        };

        follow_ups.cancel = Some(CancelSweep {
            project_id: event.source_project_id,
            ref_,
            exclude_pipeline: pipeline.id,
        });
        (Outcome::Created { pipeline: pipeline.id }, follow_ups)
    }

    /// Execute the deferred work attached to an outcome. Failures are
    /// logged and swallowed; the response has already been sent.
    pub async fn run_follow_ups(&self, follow_ups: FollowUps) {
        if let Some(sweep) = follow_ups.cancel {
            let cancelled = self
                .inner
                .canceller
                .sweep(sweep.project_id, &sweep.ref_, sweep.exclude_pipeline)
                .await;
            if cancelled > 0 {
                info!(
                    "cancelled {cancelled} redundant pending jobs on {}",
                    sweep.ref_
                );
            }
        }

        if let Some(update) = follow_ups.remove_source {
            self.update_remove_source(update).await;
        }
    }

    async fn update_remove_source(&self, update: RemoveSourceBranch) {
        let mr = match self
            .inner
            .client
            .get_merge_request(update.project_id, update.mr_iid)
            .await
        {
            Ok(mr) => mr,
            Err(err) => {
                error!("reading merge request !{} failed: {err}", update.mr_iid);
                return;
            }
        };

        if mr.force_remove_source_branch.unwrap_or(false) {
            debug!(
                "merge request !{} already forces source branch removal",
                update.mr_iid
            );
            return;
        }

        match self
            .inner
            .client
            .set_remove_source_branch(update.project_id, update.mr_iid)
            .await
        {
            Ok(updated) => info!(
                "updated merge request !{} flags: should_remove_source_branch={} force_remove_source_branch={}",
                update.mr_iid,
                updated.should_remove_source_branch.unwrap_or(false),
                updated.force_remove_source_branch.unwrap_or(false),
            ),
            Err(err) => error!(
                "setting remove_source_branch on merge request !{} failed: {err}",
                update.mr_iid
            ),
        }
    }
}
