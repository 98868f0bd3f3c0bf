// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The engine worker: a single long-lived task draining a FIFO job channel.
//
// Exactly one request is processed at a time, to completion, in acceptance
// order; no request overtakes another's use of the shared font cache.
// Each job carries its own event channel for status notices and the
// terminal response, plus a coarse cancellation flag checked only at
// stage boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::JobId;

use crate::fonts::FontResolver;
use crate::pipeline;
use crate::protocol::{EngineCommand, EngineNotice, EngineResponse};

/// Queue depth for pending jobs.
const JOB_QUEUE_DEPTH: usize = 16;

/// Queue depth for per-job events (notices + the terminal response).
const EVENT_QUEUE_DEPTH: usize = 32;

/// Everything a job emits while running.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Advisory progress text.
    Notice(EngineNotice),
    /// The terminal response.  Exactly one per delivered job; a cancelled
    /// job emits none and its event channel simply closes.
    Finished(EngineResponse),
}

/// One accepted request travelling through the worker.
struct EngineJob {
    id: JobId,
    command: EngineCommand,
    accepted_at: DateTime<Utc>,
    cancelled: Arc<AtomicBool>,
    events: mpsc::Sender<EngineEvent>,
}

/// Caller-side handle for a submitted job.
pub struct JobHandle {
    pub id: JobId,
    /// Status notices followed by at most one `Finished` event.
    pub events: mpsc::Receiver<EngineEvent>,
    cancelled: Arc<AtomicBool>,
}

impl JobHandle {
    /// Request cancellation.  Coarse and cooperative: the flag is only
    /// checked between pipeline stages, so computation already in flight
    /// runs to completion; only delivery of the result is suppressed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// The TOC generation engine: shared font state plus one FIFO worker.
pub struct TocEngine {
    jobs: mpsc::Sender<EngineJob>,
}

impl TocEngine {
    /// Spawn the engine with its own font resolver.
    pub fn spawn() -> Self {
        Self::spawn_with(Arc::new(FontResolver::new()))
    }

    /// Spawn the engine around an existing resolver (tests inject one with
    /// a controlled source list).
    pub fn spawn_with(fonts: Arc<FontResolver>) -> Self {
        let (jobs, mut rx) = mpsc::channel::<EngineJob>(JOB_QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                process_job(&fonts, job).await;
            }
            debug!("job channel closed; engine worker exiting");
        });

        Self { jobs }
    }

    /// Accept a command for processing.
    ///
    /// Jobs are processed in submission order.  The returned handle yields
    /// advisory notices and the terminal response; dropping it does not
    /// cancel the job (use [`JobHandle::cancel`]).
    pub async fn submit(&self, command: EngineCommand) -> Result<JobHandle> {
        let id = JobId::new();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let job = EngineJob {
            id,
            command,
            accepted_at: Utc::now(),
            cancelled: Arc::clone(&cancelled),
            events: events_tx,
        };
        self.jobs
            .send(job)
            .await
            .map_err(|_| BlattwerkError::Engine("engine worker is not running".into()))?;

        info!(job_id = %id, "job accepted");
        Ok(JobHandle {
            id,
            events: events_rx,
            cancelled,
        })
    }
}

/// Process one job to completion and deliver its response, unless the job
/// was cancelled; a cancelled job's result is computed but never posted.
///
/// Returns the response that was (or would have been) delivered, which is
/// what the unit tests assert against.
async fn process_job(fonts: &FontResolver, job: EngineJob) -> Option<EngineResponse> {
    let EngineJob {
        id,
        command,
        accepted_at,
        cancelled,
        events,
    } = job;

    let options = command.options();
    let EngineCommand::GenerateToc { document_bytes, .. } = command;

    info!(
        job_id = %id,
        document_bytes = document_bytes.len(),
        title = %options.title,
        "processing TOC generation job"
    );

    let outcome = pipeline::run(&document_bytes, &options, fonts, &cancelled, &events).await;

    let response = match outcome {
        Ok(Some(bytes)) => EngineResponse::Success {
            document_bytes: bytes,
        },
        Ok(None) => {
            info!(job_id = %id, "job cancelled; no result delivered");
            return None;
        }
        Err(err) => {
            warn!(job_id = %id, error = %err, "job failed");
            EngineResponse::Error {
                message: err.to_string(),
            }
        }
    };

    if cancelled.load(Ordering::SeqCst) {
        info!(job_id = %id, "job cancelled after completion; suppressing result");
        return None;
    }

    let elapsed_ms = Utc::now()
        .signed_duration_since(accepted_at)
        .num_milliseconds();
    info!(job_id = %id, elapsed_ms, "job finished");

    let _ = events.send(EngineEvent::Finished(response.clone())).await;
    Some(response)
}
