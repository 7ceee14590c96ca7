use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {path}: {message}")]
    Snapshot { path: String, message: String },

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("Notification error: {notifier}: {message}")]
    Notification { notifier: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
