use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::comparison::ComparisonReport;
use crate::config::{AppConfig, SnapshotConfig};
use crate::models::{Catalog, Company, PriceMatrix};
use crate::orchestrator::Orchestrator;
use crate::plugins::{NotifierManager, UndercutAlert};
use crate::retry::{RetryController, RetryPolicy};
use crate::scraper::{HttpFetcher, PriceSource};
use crate::snapshot;
use crate::utils::error::Result;

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub resolved_cells: usize,
    pub unresolved_cells: usize,
    pub undercut_count: usize,
    pub any_undercut: bool,
    pub notifications_sent: usize,
}

/// One run: baseline, fetch, compare, persist, notify.
pub struct PriceMonitor<S = HttpFetcher> {
    catalog: Catalog,
    companies: Vec<Company>,
    orchestrator: Orchestrator<S>,
    notifiers: NotifierManager,
    snapshot: SnapshotConfig,
}

impl PriceMonitor<HttpFetcher> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = config.build_catalog()?;
        let companies = config.build_companies(&catalog)?;

        let fetcher = HttpFetcher::new(&config.scraper)?;
        let policy = RetryPolicy::from_config(&config.scraper);
        let controller = RetryController::new(Arc::new(fetcher), policy);
        let orchestrator = Orchestrator::new(controller, config.scraper.max_concurrent_fetches);

        Ok(Self::new(
            catalog,
            companies,
            orchestrator,
            NotifierManager::from_config(&config.notifications),
            config.snapshot.clone(),
        ))
    }
}

impl<S: PriceSource + 'static> PriceMonitor<S> {
    pub fn new(
        catalog: Catalog,
        companies: Vec<Company>,
        orchestrator: Orchestrator<S>,
        notifiers: NotifierManager,
        snapshot: SnapshotConfig,
    ) -> Self {
        Self {
            catalog,
            companies,
            orchestrator,
            notifiers,
            snapshot,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Execute a full run.
    ///
    /// The baseline is read before any fetch starts, so an unreadable snapshot
    /// aborts the run without touching the network. The snapshot is replaced
    /// only after every fetch has finished.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run_once(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            companies = self.companies.len(),
            models = self.catalog.len(),
            max_concurrent = self.orchestrator.max_concurrent(),
            "Starting price run"
        );

        let baseline = snapshot::read_baseline(&self.snapshot.path, &self.catalog, &self.snapshot)?;

        let competitors = self.orchestrator.run(&self.catalog, &self.companies).await;
        let matrix = PriceMatrix::new(self.catalog.clone(), baseline, competitors)?;
        let report = ComparisonReport::from_matrix(&matrix);

        snapshot::write_snapshot(
            &self.snapshot.path,
            &matrix,
            &report,
            &self.snapshot,
            Local::now().date_naive(),
        )?;

        let notifications_sent = if report.any_undercut {
            let alert = UndercutAlert::new(run_id, self.snapshot.baseline_title.clone(), &report);
            self.notifiers.notify_all(&alert).await
        } else {
            0
        };

        let run = RunReport {
            run_id,
            started_at,
            elapsed: clock.elapsed(),
            resolved_cells: matrix.resolved_cells(),
            unresolved_cells: matrix.unresolved_cells(),
            undercut_count: report.undercut_count(),
            any_undercut: report.any_undercut,
            notifications_sent,
        };

        info!(
            run_id = %run.run_id,
            resolved = run.resolved_cells,
            unresolved = run.unresolved_cells,
            undercuts = run.undercut_count,
            elapsed_ms = run.elapsed.as_millis() as u64,
            snapshot = %self.snapshot.path.display(),
            "Price run complete"
        );

        Ok(run)
    }
}
