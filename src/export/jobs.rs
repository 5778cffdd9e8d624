//! Background export jobs.
//!
//! `POST /api/v1/export/jobs` spawns the pipeline on a tokio task and returns
//! an id; the UI polls `GET /api/v1/export/jobs/{id}` for the latest snapshot
//! and, once complete, the documents.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use super::fetch::ContentSource;
use super::pipeline::{export_repository, ExportOptions, ExportOutput};
use super::progress::ProgressSnapshot;
use super::tree::TreeEntry;
use crate::error::{AppError, Result};
use crate::github::RepoId;

/// Finished jobs kept for polling before the oldest is dropped.
const MAX_FINISHED_JOBS: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    pub id: u64,
    pub repo: String,
    pub status: JobStatus,
    pub progress: ProgressSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ExportOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Default)]
struct JobTable {
    next_id: u64,
    jobs: HashMap<u64, ExportJob>,
    finished: VecDeque<u64>,
}

#[derive(Clone, Default)]
pub struct ExportJobs {
    inner: Arc<RwLock<JobTable>>,
}

impl ExportJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<S>(
        &self,
        source: Arc<S>,
        repo: RepoId,
        entries: Vec<TreeEntry>,
        options: ExportOptions,
    ) -> Result<u64>
    where
        S: ContentSource + 'static,
    {
        let id = self.register(&repo)?;
        let jobs = self.clone();

        tokio::spawn(async move {
            let progress_jobs = jobs.clone();
            let result = export_repository(&*source, &repo, &entries, &options, move |snapshot| {
                progress_jobs.update_progress(id, snapshot);
            })
            .await;
            jobs.finish(id, result);
        });

        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<ExportJob> {
        let table = self.inner.read().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        table
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("export job {}", id)))
    }

    fn register(&self, repo: &RepoId) -> Result<u64> {
        let mut table = self.inner.write().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        table.next_id += 1;
        let id = table.next_id;
        table.jobs.insert(
            id,
            ExportJob {
                id,
                repo: repo.to_string(),
                status: JobStatus::Running,
                progress: ProgressSnapshot::default(),
                output: None,
                error: None,
            },
        );
        tracing::debug!("Registered export job {} for {}", id, repo);
        Ok(id)
    }

    fn update_progress(&self, id: u64, snapshot: ProgressSnapshot) {
        let Ok(mut table) = self.inner.write() else {
            return;
        };
        if let Some(job) = table.jobs.get_mut(&id) {
            job.progress = snapshot;
        }
    }

    fn finish(&self, id: u64, result: Result<ExportOutput>) {
        let Ok(mut table) = self.inner.write() else {
            return;
        };
        if let Some(job) = table.jobs.get_mut(&id) {
            match result {
                Ok(output) => {
                    job.status = JobStatus::Complete;
                    job.output = Some(output);
                }
                Err(e) => {
                    tracing::warn!("Export job {} failed: {}", id, e);
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                }
            }
        }

        table.finished.push_back(id);
        while table.finished.len() > MAX_FINISHED_JOBS {
            if let Some(oldest) = table.finished.pop_front() {
                table.jobs.remove(&oldest);
            }
        }
    }
}
