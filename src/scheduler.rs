use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::price_monitor::{PriceMonitor, RunReport};
use crate::scraper::PriceSource;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchStats {
    pub started_at: DateTime<Utc>,
    pub completed_runs: u64,
    pub failed_runs: u64,
    pub skipped_runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_report: Option<RunReport>,
}

impl Default for WatchStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            completed_runs: 0,
            failed_runs: 0,
            skipped_runs: 0,
            last_run: None,
            last_error: None,
            last_report: None,
        }
    }
}

/// Clears the in-progress flag when the tick ends, even by unwinding.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Repeats [`PriceMonitor::run_once`] on a cron schedule. A tick that fires
/// while the previous run is still going is skipped.
pub struct WatchScheduler {
    scheduler: JobScheduler,
    job_id: Uuid,
    cron_expression: String,
    stats: Arc<RwLock<WatchStats>>,
}

impl WatchScheduler {
    pub async fn new<S: PriceSource + 'static>(
        monitor: Arc<PriceMonitor<S>>,
        cron_expression: &str,
    ) -> Result<Self> {
        if !Self::validate_cron_expression(cron_expression) {
            return Err(AppError::Validation(format!(
                "Invalid cron expression '{}': expected 6 or 7 fields, seconds first",
                cron_expression
            )));
        }

        let scheduler = JobScheduler::new().await?;
        let stats = Arc::new(RwLock::new(WatchStats::default()));
        let running = Arc::new(AtomicBool::new(false));

        let stats_for_job = Arc::clone(&stats);
        let job = Job::new_async(cron_expression, move |_uuid, _l| {
            let monitor = Arc::clone(&monitor);
            let running = Arc::clone(&running);
            let stats = Arc::clone(&stats_for_job);

            Box::pin(async move {
                Self::execute_tick(&*monitor, &running, &stats).await;
            })
        })?;

        let job_id = scheduler.add(job).await?;

        Ok(Self {
            scheduler,
            job_id,
            cron_expression: cron_expression.to_string(),
            stats,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        self.scheduler.start().await?;
        tracing::info!(
            cron = %self.cron_expression,
            job_id = %self.job_id,
            "Watch scheduler started"
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Watch scheduler shutdown");
        Ok(())
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expression
    }

    pub async fn stats(&self) -> WatchStats {
        self.stats.read().await.clone()
    }

    async fn execute_tick<S: PriceSource + 'static>(
        monitor: &PriceMonitor<S>,
        running: &AtomicBool,
        stats: &RwLock<WatchStats>,
    ) {
        let Some(guard) = RunningGuard::acquire(running) else {
            tracing::warn!("Previous price run still in progress, skipping this tick");
            stats.write().await.skipped_runs += 1;
            return;
        };

        let result = monitor.run_once().await;
        drop(guard);

        let mut stats = stats.write().await;
        stats.last_run = Some(Utc::now());
        match result {
            Ok(report) => {
                stats.completed_runs += 1;
                stats.last_error = None;
                stats.last_report = Some(report);
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled price run failed");
                stats.failed_runs += 1;
                stats.last_error = Some(e.to_string());
            }
        }
    }

    /// Six fields (sec min hour day month weekday) with an optional year.
    pub fn validate_cron_expression(expression: &str) -> bool {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if !(6..=7).contains(&parts.len()) {
            return false;
        }

        // Numbers, ranges, lists, wildcards, steps and names like MON or JAN
        parts.iter().all(|part| {
            part.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | ',' | '/' | '?' | '#')
            })
        })
    }
}
