use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::models::{Catalog, Company, PriceColumn};
use crate::retry::{CellRef, RetryController};
use crate::scraper::PriceSource;

/// Fans fetches out over every (company, model) pair that has a link.
///
/// Each cell is owned by exactly one task, which hands its result back to
/// the company's joiner; the joiner is the only writer of that column. A
/// shared semaphore caps how many fetches are in flight across all companies.
pub struct Orchestrator<S> {
    controller: Arc<RetryController<S>>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl<S: PriceSource + 'static> Orchestrator<S> {
    pub fn new(controller: RetryController<S>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            controller: Arc::new(controller),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns one column per company, in the order given. Completes only
    /// once every company's tasks have finished.
    pub async fn run(&self, catalog: &Catalog, companies: &[Company]) -> Vec<PriceColumn> {
        let runs = companies.iter().map(|company| self.run_company(catalog, company));
        join_all(runs).await
    }

    async fn run_company(&self, catalog: &Catalog, company: &Company) -> PriceColumn {
        let mut column = PriceColumn::unresolved(company.title.clone(), catalog.len());
        let title: Arc<str> = Arc::from(company.title.as_str());
        let rule = Arc::new(company.rule.clone());
        let mut tasks = JoinSet::new();

        for (index, link) in company.sourced_links() {
            let controller = Arc::clone(&self.controller);
            let permits = Arc::clone(&self.permits);
            let title = Arc::clone(&title);
            let rule = Arc::clone(&rule);
            let model = catalog.model(index).unwrap_or_default().to_string();
            let link = link.to_string();

            tasks.spawn(async move {
                // The semaphore is never closed, so this only waits.
                let _permit = permits.acquire_owned().await.ok();
                let cell = CellRef {
                    company: &title,
                    model: &model,
                };
                (index, controller.resolve(cell, &link, &rule).await)
            });
        }

        let sourced = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, resolution)) => column.prices[index] = resolution.price,
                Err(e) => error!(
                    company = %company.title,
                    error = %e,
                    "Fetch task failed, price left unresolved"
                ),
            }
        }

        info!(
            company = %company.title,
            resolved = column.resolved_count(),
            sourced,
            "Company prices collected"
        );
        column
    }
}
