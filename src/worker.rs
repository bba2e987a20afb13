//! Background transcode worker.
//!
//! Polls the job store for queued jobs, claims one at a time, probes and
//! gates the input, runs the planned encode while persisting debounced
//! progress, finalizes the job, and triggers best-effort delivery.  Any
//! error while processing one job is contained to that job; the loop keeps
//! serving subsequent jobs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use vp_av::{probe_file, run_encode, EncodePlan};
use vp_db::models::Job;
use vp_db::queries::jobs::{self, JobUpdate};
use vp_core::{Error, JobSource, JobStatus};

use crate::context::WorkerContext;

/// Run a worker loop until the cancellation token is triggered.
///
/// Multiple instances may run in parallel; the atomic claim in the job
/// store guarantees exclusive ownership of each job.
pub async fn run_worker(ctx: WorkerContext, cancel: CancellationToken) {
    tracing::info!("Worker started");

    let poll_interval = Duration::from_secs(ctx.config.worker.poll_interval_secs.max(1));

    loop {
        if cancel.is_cancelled() {
            tracing::info!("Worker shutting down");
            break;
        }

        match process_next_job(&ctx).await {
            Ok(true) => {
                // Processed a job; immediately check for the next one.
                continue;
            }
            Ok(false) => {
                // Queue empty; wait before polling again.
            }
            Err(e) => {
                tracing::error!("Worker error: {e}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = cancel.cancelled() => { break; }
        }
    }

    tracing::info!("Worker stopped");
}

/// Try to claim and process the next job.
///
/// Returns `Ok(true)` if a job was claimed, `Ok(false)` if the queue was
/// empty.
pub async fn process_next_job(ctx: &WorkerContext) -> vp_core::Result<bool> {
    let conn = vp_db::pool::get_conn(&ctx.db)?;
    let job = jobs::claim_next(&conn)?;
    drop(conn);

    let Some(job) = job else {
        return Ok(false);
    };

    tracing::info!(job_id = %job.id, input = %job.input_path, "Processing job");
    process_job(ctx, &job).await;
    Ok(true)
}

/// Outcome of a successful encode, applied to the job record on completion.
struct JobSuccess {
    output_path: PathBuf,
    output_bytes: i64,
    duration_seconds: i64,
}

/// A job-level failure: the error's display form lands in `error_message`
/// (policy rejections display bare, so the gate message is stored verbatim);
/// the measured duration is recorded when it was determined before the
/// failure.
struct JobFailure {
    message: String,
    duration_seconds: Option<i64>,
}

impl JobFailure {
    fn new(error: Error) -> Self {
        Self {
            message: error.to_string(),
            duration_seconds: None,
        }
    }

    fn with_duration(error: Error, duration_seconds: i64) -> Self {
        Self {
            message: error.to_string(),
            duration_seconds: Some(duration_seconds),
        }
    }
}

/// Process one claimed job end to end, finalizing its status.
///
/// Never returns an error: every failure is recorded on the job record and
/// logged, keeping the loop alive.
pub async fn process_job(ctx: &WorkerContext, job: &Job) {
    if !Path::new(&job.input_path).exists() {
        finalize_error(ctx, job, JobFailure::new(Error::Policy("Input file missing".into())));
        return;
    }

    let output_path = ctx.config.storage.output_dir.join(format!("{}.mp4", job.id));

    match execute_job(ctx, job, &output_path).await {
        Ok(success) => {
            let update = JobUpdate {
                status: Some(JobStatus::Done),
                output_path: Some(success.output_path.to_string_lossy().to_string()),
                output_bytes: Some(success.output_bytes),
                duration_seconds: Some(success.duration_seconds),
                progress: Some(100),
                ..Default::default()
            };
            if let Err(e) = apply_update(ctx, job, &update) {
                tracing::error!(job_id = %job.id, "Failed to finalize job: {e}");
                return;
            }
            tracing::info!(
                job_id = %job.id,
                output_bytes = success.output_bytes,
                "Job completed"
            );

            // Best-effort delivery; never reopens or alters job status.
            if job.source == JobSource::Bot {
                let done = Job {
                    status: JobStatus::Done,
                    output_bytes: success.output_bytes,
                    ..job.clone()
                };
                ctx.notifier.notify_job_done(&done, &success.output_path).await;
            }
        }
        Err(failure) => {
            // Delete any partially written output, best effort.
            if output_path.exists() {
                if let Err(e) = std::fs::remove_file(&output_path) {
                    tracing::warn!(
                        job_id = %job.id,
                        "Failed to remove partial output: {e}"
                    );
                }
            }
            finalize_error(ctx, job, failure);
        }
    }
}

/// Probe, gate, plan, and encode. Pure orchestration; all persistence except
/// progress updates happens in [`process_job`].
async fn execute_job(
    ctx: &WorkerContext,
    job: &Job,
    output_path: &Path,
) -> Result<JobSuccess, JobFailure> {
    let input_path = Path::new(&job.input_path);

    let report = probe_file(&ctx.tools, input_path)
        .await
        .map_err(JobFailure::new)?;

    if report.duration_secs <= 0.0 {
        return Err(JobFailure::new(Error::Policy(
            "Unable to determine duration".into(),
        )));
    }

    let duration_seconds = report.duration_secs as i64;
    if report.duration_secs > ctx.config.worker.max_duration_seconds as f64 {
        return Err(JobFailure::with_duration(
            Error::Policy("Duration exceeds limit".into()),
            duration_seconds,
        ));
    }

    let plan = EncodePlan::build(job.profile, report.width, report.height);

    let db = ctx.db.clone();
    let job_id = job.id;
    let on_progress = move |percent: i64| {
        let result = vp_db::pool::get_conn(&db)
            .and_then(|conn| jobs::update_job(&conn, job_id, &JobUpdate::progress(percent)));
        if let Err(e) = result {
            tracing::warn!(job_id = %job_id, "Failed to persist progress: {e}");
        }
    };

    run_encode(
        &ctx.tools,
        &plan,
        input_path,
        output_path,
        report.duration_secs,
        on_progress,
    )
    .await
    .map_err(|e| JobFailure::with_duration(e, duration_seconds))?;

    let output_bytes = std::fs::metadata(output_path)
        .map_err(|e| JobFailure::with_duration(Error::from(e), duration_seconds))?
        .len() as i64;

    Ok(JobSuccess {
        output_path: output_path.to_path_buf(),
        output_bytes,
        duration_seconds,
    })
}

fn finalize_error(ctx: &WorkerContext, job: &Job, failure: JobFailure) {
    tracing::error!(job_id = %job.id, error = %failure.message, "Job failed");
    let update = JobUpdate {
        status: Some(JobStatus::Error),
        error_message: Some(failure.message),
        duration_seconds: failure.duration_seconds,
        ..Default::default()
    };
    if let Err(e) = apply_update(ctx, job, &update) {
        tracing::error!(job_id = %job.id, "Failed to record job error: {e}");
    }
}

fn apply_update(ctx: &WorkerContext, job: &Job, update: &JobUpdate) -> vp_core::Result<()> {
    let conn = vp_db::pool::get_conn(&ctx.db)?;
    jobs::update_job(&conn, job.id, update)?;
    Ok(())
}
