//! Background job scheduler for recurring scrape runs.
//!
//! The expected start of each run is the tick the scheduler reported for
//! this job during the previous run, so `timing_delay_seconds` in the run
//! summary measures how late the job actually fired.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pricewatch_runner::{Orchestrator, RunRequest};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler when a cron expression is configured.
///
/// Returns `None` without starting anything when `cron` is `None`. The
/// returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it shuts down the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the expression is invalid or the
/// scheduler cannot be initialised or started.
pub async fn build_scheduler(
    orchestrator: Arc<Orchestrator>,
    cron: Option<&str>,
    keyword: Option<String>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(cron) = cron else {
        tracing::info!("scheduler: no schedule configured, scheduled runs disabled");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;
    register_scrape_job(&scheduler, cron, orchestrator, keyword).await?;
    scheduler.start().await?;
    Ok(Some(scheduler))
}

/// Registers the recurring scrape over every configured vendor.
async fn register_scrape_job(
    scheduler: &JobScheduler,
    cron: &str,
    orchestrator: Arc<Orchestrator>,
    keyword: Option<String>,
) -> Result<(), JobSchedulerError> {
    let expected_next: Arc<Mutex<Option<DateTime<Utc>>>> = Arc::new(Mutex::new(None));
    let job_expected_next = Arc::clone(&expected_next);

    let job = Job::new_async(cron, move |uuid, mut lock| {
        let orchestrator = Arc::clone(&orchestrator);
        let keyword = keyword.clone();
        let expected_next = Arc::clone(&job_expected_next);

        Box::pin(async move {
            let server_time = Utc::now();
            let expected_start = expected_next.lock().await.take();
            match lock.next_tick_for_job(uuid).await {
                Ok(next) => *expected_next.lock().await = next,
                Err(e) => tracing::warn!(error = %e, "scheduler: could not read next tick"),
            }

            tracing::info!("scheduler: starting scheduled scrape run");
            let summary = orchestrator
                .run(RunRequest {
                    search_keyword: keyword,
                    server_time: Some(server_time),
                    expected_start_time: expected_start,
                    ..RunRequest::default()
                })
                .await;
            tracing::info!(
                successful = summary.successful_vendors,
                failed = summary.failed_vendors,
                delay_secs = ?summary.timing_delay_seconds,
                "scheduler: scheduled scrape run complete"
            );
        })
    })?;

    let job_id = scheduler.add(job).await?;

    let mut handle = scheduler.clone();
    match handle.next_tick_for_job(job_id).await {
        Ok(first) => *expected_next.lock().await = first,
        Err(e) => tracing::warn!(error = %e, "scheduler: could not read first tick"),
    }
    tracing::info!(cron, "scheduler: registered scrape job");
    Ok(())
}
