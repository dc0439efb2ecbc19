//! Background enrichment jobs.
//!
//! Jobs are queued on a channel and run one after another by a single
//! worker task. Submitting returns immediately with a [`JobTicket`]; the
//! job's state can be observed through the ticket or looked up by id.
//! There is no cancellation: a started job runs to completion. Only the
//! most recent finished jobs are remembered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::ContentEntry;
use crate::store::Table;

use super::worker::{EnrichReport, Enricher};

/// Errors that can occur with enrichment jobs
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Unknown job: {0}")]
    UnknownJob(Uuid),

    #[error("Enrichment worker has stopped")]
    WorkerStopped,
}

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// Observable state of one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub id: Uuid,

    /// Table being enriched
    pub table: String,

    /// Whether existing chapter data is recomputed
    pub force: bool,

    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Set once the job is done
    pub report: Option<EnrichReport>,

    /// Set if the job failed
    pub error: Option<String>,
}

/// A queued job
struct Job {
    id: Uuid,
    table: Table<ContentEntry>,
    force: bool,
    state: watch::Sender<JobState>,
}

/// Handle returned on submission
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub id: Uuid,
    state: watch::Receiver<JobState>,
}

impl JobTicket {
    /// Current state snapshot
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Wait until the job is done or failed
    pub async fn wait(mut self) -> JobState {
        let finished = self
            .state
            .wait_for(|s| s.status.is_finished())
            .await
            .map(|s| s.clone());

        match finished {
            Ok(state) => state,
            // Worker gone; report the last state it published
            Err(_) => self.state.borrow().clone(),
        }
    }
}

/// Finished jobs kept for status lookups by default
pub const DEFAULT_JOB_HISTORY: usize = 64;

type Registry = HashMap<Uuid, watch::Receiver<JobState>>;

/// Queue plus the worker task draining it
pub struct EnrichmentJobs {
    tx: mpsc::UnboundedSender<Job>,
    jobs: Arc<Mutex<Registry>>,
    history: usize,
}

impl EnrichmentJobs {
    /// Start the worker task. Must be called inside a Tokio runtime.
    pub fn spawn(enricher: Arc<Enricher>) -> Self {
        Self::with_history(enricher, DEFAULT_JOB_HISTORY)
    }

    /// Start the worker task, remembering at most `history` finished jobs
    pub fn with_history(enricher: Arc<Enricher>, history: usize) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                run_job(&enricher, job).await;
            }
        });

        Self {
            tx,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            history,
        }
    }

    /// Queue an enrichment pass over `table`
    pub fn submit(&self, table: Table<ContentEntry>, force: bool) -> Result<JobTicket, JobError> {
        let id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(JobState {
            id,
            table: table.name().to_string(),
            force,
            status: JobStatus::Pending,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            report: None,
            error: None,
        });

        self.tx
            .send(Job {
                id,
                table,
                force,
                state: state_tx,
            })
            .map_err(|_| JobError::WorkerStopped)?;

        let mut jobs = self.registry();
        prune_finished(&mut jobs, self.history);
        jobs.insert(id, state_rx.clone());
        drop(jobs);

        info!(job = %id, force, "Enrichment job queued");

        Ok(JobTicket {
            id,
            state: state_rx,
        })
    }

    /// State of a submitted job
    pub fn status(&self, id: Uuid) -> Result<JobState, JobError> {
        self.registry()
            .get(&id)
            .map(|rx| rx.borrow().clone())
            .ok_or(JobError::UnknownJob(id))
    }

    /// All submitted jobs, oldest first
    pub fn list(&self) -> Vec<JobState> {
        let mut states: Vec<JobState> = self
            .registry()
            .values()
            .map(|rx| rx.borrow().clone())
            .collect();
        states.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        states
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drop the oldest finished jobs beyond `keep`
fn prune_finished(jobs: &mut Registry, keep: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .iter()
        .filter_map(|(id, rx)| {
            let state = rx.borrow();
            state
                .status
                .is_finished()
                .then(|| (state.finished_at.unwrap_or(state.submitted_at), *id))
        })
        .collect();

    if finished.len() <= keep {
        return;
    }

    finished.sort();
    let excess = finished.len() - keep;
    for (_, id) in &finished[..excess] {
        jobs.remove(id);
    }
    debug!(removed = excess, "Pruned finished enrichment jobs");
}

async fn run_job(enricher: &Enricher, job: Job) {
    job.state.send_modify(|s| {
        s.status = JobStatus::Running;
        s.started_at = Some(Utc::now());
    });
    info!(job = %job.id, table = job.table.name(), force = job.force, "Enrichment job started");

    let result = enricher.enrich_table(&job.table, job.force).await;

    job.state.send_modify(|s| {
        s.finished_at = Some(Utc::now());
        match result {
            Ok(report) => {
                s.status = JobStatus::Done;
                s.report = Some(report);
            }
            Err(e) => {
                error!(job = %job.id, error = %e, "Enrichment job failed");
                s.status = JobStatus::Failed;
                s.error = Some(e.to_string());
            }
        }
    });
}
