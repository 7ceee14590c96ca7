use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::models::{ExtractionRule, Price, UNRESOLVED};
use crate::scraper::{FetchError, FetchOutcome, PriceSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Zero disables waiting between attempts.
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts,
            base_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            attempt_timeout: Some(Duration::from_secs(config.attempt_timeout_secs)),
        }
    }

    /// Waits between consecutive attempts: base, 2x base, 4x base, ... capped
    /// at `max_delay`.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        if self.base_delay.is_zero() {
            return Box::new(std::iter::repeat(Duration::ZERO));
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let first = self.base_delay.min(self.max_delay);
        let backoff = ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(self.max_delay);

        Box::new(std::iter::once(first).chain(backoff))
    }
}

/// Progress of one cell through its attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// An attempt is due; `remaining` more may follow it.
    Attempting { remaining: u32 },
    Resolved(Price),
    Exhausted,
}

impl RetryState {
    pub fn start(max_attempts: u32) -> Self {
        match max_attempts {
            0 => RetryState::Exhausted,
            n => RetryState::Attempting { remaining: n - 1 },
        }
    }

    /// Feed the result of the current attempt: `Some(price)` when a price was
    /// found, `None` for an error or a missing element.
    pub fn advance(self, found: Option<Price>) -> Self {
        match (self, found) {
            (RetryState::Attempting { .. }, Some(price)) => RetryState::Resolved(price),
            (RetryState::Attempting { remaining: 0 }, None) => RetryState::Exhausted,
            (RetryState::Attempting { remaining }, None) => RetryState::Attempting {
                remaining: remaining - 1,
            },
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting { .. })
    }
}

/// Names a (company, model) cell for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    pub company: &'a str,
    pub model: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub price: Price,
    pub attempts: u32,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.price != UNRESOLVED
    }
}

pub struct RetryController<S> {
    source: Arc<S>,
    policy: RetryPolicy,
}

impl<S: PriceSource> RetryController<S> {
    pub fn new(source: Arc<S>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch until a price is found or the attempt budget runs out. Never
    /// fails: exhaustion yields the unresolved sentinel.
    pub async fn resolve(
        &self,
        cell: CellRef<'_>,
        link: &str,
        rule: &ExtractionRule,
    ) -> Resolution {
        let mut state = RetryState::start(self.policy.max_attempts);
        let mut delays = self.policy.delays();
        let mut attempts = 0;
        let mut last_failure = String::new();

        while let RetryState::Attempting { remaining } = state {
            attempts += 1;

            let found = match self.attempt(link, rule).await {
                Ok(FetchOutcome::Found(price)) => {
                    record_attempt("found");
                    debug!(
                        company = cell.company,
                        model = cell.model,
                        attempt = attempts,
                        remaining,
                        price,
                        "Price found"
                    );
                    Some(price)
                }
                Ok(FetchOutcome::NotFound(reason)) => {
                    record_attempt("not_found");
                    debug!(
                        company = cell.company,
                        model = cell.model,
                        attempt = attempts,
                        remaining,
                        ?reason,
                        selector = %rule.selector,
                        attribute = %rule.attribute,
                        "Price element not found, link may be outdated"
                    );
                    last_failure = format!("not found ({:?})", reason);
                    None
                }
                Err(e) => {
                    record_attempt("error");
                    debug!(
                        company = cell.company,
                        model = cell.model,
                        attempt = attempts,
                        remaining,
                        error = %e,
                        "Fetch attempt failed"
                    );
                    last_failure = e.to_string();
                    None
                }
            };

            state = state.advance(found);

            if !state.is_terminal() {
                if let Some(delay) = delays.next().filter(|d| !d.is_zero()) {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let price = match state {
            RetryState::Resolved(price) => {
                metrics::counter!("price_watcher_cells_total", "state" => "resolved").increment(1);
                price
            }
            _ => {
                metrics::counter!("price_watcher_cells_total", "state" => "exhausted").increment(1);
                warn!(
                    company = cell.company,
                    model = cell.model,
                    attempts,
                    last_failure = %last_failure,
                    "Giving up on price after exhausting attempts"
                );
                UNRESOLVED
            }
        };

        Resolution { price, attempts }
    }

    async fn attempt(&self, link: &str, rule: &ExtractionRule) -> Result<FetchOutcome, FetchError> {
        match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.fetch(link, rule))
                .await
                .unwrap_or_else(|_| Err(FetchError::Timeout(limit))),
            None => self.source.fetch(link, rule).await,
        }
    }
}

fn record_attempt(outcome: &'static str) {
    metrics::counter!("price_watcher_fetch_attempts_total", "outcome" => outcome).increment(1);
}
