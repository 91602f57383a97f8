use std::sync::Arc;

use log::{error, info};

use crate::gitlab::GitLabClient;

/// Cancels still-pending jobs of running pipelines that a newer pipeline
/// has made redundant. Best-effort cleanup only: every failure is logged
/// per operation and never aborts the sweep.
pub struct Canceller {
    client: Arc<GitLabClient>,
}

impl Canceller {
    pub fn new(client: Arc<GitLabClient>) -> Self {
        Self { client }
    }

    /// Cancel the pending jobs of every running pipeline on `ref_` other
    /// than `exclude_pipeline`. Pipelines are processed oldest first.
    /// Returns the number of jobs cancelled.
    pub async fn sweep(&self, project_id: u64, ref_: &str, exclude_pipeline: u64) -> usize {
        let pipelines = match self.client.list_running_pipelines(project_id, ref_).await {
            Ok(pipelines) => pipelines,
            Err(err) => {
                error!("listing running pipelines on {ref_} failed: {err}");
                return 0;
            }
        };

        let mut cancelled = 0;
        for pipeline in pipelines {
            if pipeline.id == exclude_pipeline {
                continue;
            }

            let jobs = match self.client.list_pending_jobs(project_id, pipeline.id).await {
                Ok(jobs) => jobs,
                Err(err) => {
                    error!(
                        "listing pending jobs of pipeline {} failed: {err}",
                        pipeline.id
                    );
                    continue;
                }
            };

            for job in jobs {
                info!(
                    "cancelling pending job {} ({}) in pipeline {}",
                    job.id, job.name, pipeline.id
                );
                match self.client.cancel_job(project_id, job.id).await {
                    Ok(_) => cancelled += 1,
                    Err(err) => error!("cancelling job {} failed: {err}", job.id),
                }
            }
        }

        cancelled
    }
}
