pub mod comparison;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod plugins;
pub mod price_monitor;
pub mod retry;
pub mod scheduler;
pub mod scraper;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types
pub use crate::comparison::{ComparisonReport, Undercut};
pub use crate::config::AppConfig;
pub use crate::price_monitor::{PriceMonitor, RunReport};
pub use crate::scheduler::WatchScheduler;
pub use crate::scraper::{FetchError, FetchOutcome, HttpFetcher, PriceSource};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
