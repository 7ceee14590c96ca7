use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;
use validator::Validate;

use crate::models::{Catalog, Company, ExtractionRule};
use crate::utils::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub catalog: Vec<String>,
    pub companies: Vec<CompanyConfig>,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One competitor as written in the config file. A `color` key may be present
/// for spreadsheet tooling; it is not read here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyConfig {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub selector: String,
    #[validate(length(min = 1))]
    pub attribute: String,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScraperConfig {
    #[validate(range(min = 1))]
    pub max_concurrent_fetches: usize,
    #[validate(range(min = 1))]
    pub retry_attempts: u32,
    /// Zero retries immediately.
    pub retry_delay_ms: u64,
    /// Cap on the doubling delay; at least `retry_delay_ms` when that is set.
    pub max_retry_delay_ms: u64,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub attempt_timeout_secs: u64,
    #[validate(length(min = 1))]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            retry_attempts: 30,
            retry_delay_ms: 0,
            max_retry_delay_ms: 5000,
            request_timeout_secs: 30,
            attempt_timeout_secs: 60,
            user_agent: format!("PriceWatcher/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub header_rows: usize,
    pub baseline_column: usize,
    pub baseline_title: String,
    pub date_format: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("prices.csv"),
            header_rows: 2,
            baseline_column: 1,
            baseline_title: "iMarket".to_string(),
            date_format: "%d-%m-%Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "Price Watcher".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
}

impl AppConfig {
    /// Load `path` (format picked from its extension), then apply
    /// `PRICE_WATCHER__SECTION__KEY` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("PRICE_WATCHER").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let catalog = Catalog::new(self.catalog.clone())
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        self.scraper
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid scraper settings: {}", e)))?;

        if self.scraper.retry_delay_ms > 0
            && self.scraper.max_retry_delay_ms < self.scraper.retry_delay_ms
        {
            return Err(ConfigError::Message(format!(
                "Invalid scraper settings: max_retry_delay_ms ({}) is below retry_delay_ms ({})",
                self.scraper.max_retry_delay_ms, self.scraper.retry_delay_ms
            )));
        }

        if self.companies.is_empty() {
            return Err(ConfigError::Message("At least one company must be configured".into()));
        }

        let mut titles = HashSet::new();
        titles.insert(self.snapshot.baseline_title.as_str());

        for company in &self.companies {
            company.validate().map_err(|e| {
                ConfigError::Message(format!("Invalid company '{}': {}", company.title, e))
            })?;

            if !titles.insert(company.title.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Company title '{}' is used more than once (the baseline title counts too)",
                    company.title
                )));
            }

            catalog
                .ensure_aligned(&format!("Company '{}' links", company.title), company.links.len())
                .map_err(|e| ConfigError::Message(e.to_string()))?;

            if scraper::Selector::parse(&company.selector).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid CSS selector for company '{}': {}",
                    company.title, company.selector
                )));
            }

            for link in company.links.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
                if !is_http_url(link) {
                    return Err(ConfigError::Message(format!(
                        "Invalid link for company '{}': {}",
                        company.title, link
                    )));
                }
            }
        }

        if self.snapshot.header_rows == 0 {
            return Err(ConfigError::Message("Snapshot header_rows must be greater than 0".into()));
        }

        if !is_valid_date_format(&self.snapshot.date_format) {
            return Err(ConfigError::Message(format!(
                "Invalid snapshot date_format: {}",
                self.snapshot.date_format
            )));
        }

        if let Some(webhook) = &self.notifications.discord.webhook_url {
            if !is_http_url(webhook) {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        Ok(())
    }

    pub fn build_catalog(&self) -> Result<Catalog> {
        Catalog::new(self.catalog.clone())
    }

    pub fn build_companies(&self, catalog: &Catalog) -> Result<Vec<Company>> {
        self.companies
            .iter()
            .map(|c| {
                Company::new(
                    c.title.clone(),
                    ExtractionRule::new(c.selector.clone(), c.attribute.clone()),
                    c.links.clone(),
                    catalog,
                )
            })
            .collect()
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn is_valid_date_format(format: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}
