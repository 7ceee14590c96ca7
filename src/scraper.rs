use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

use crate::config::ScraperConfig;
use crate::models::{ExtractionRule, Price};
use crate::utils::error::Result;

/// Why a fetched page yielded no price. Both point at a stale extraction
/// rule or a page that shows no price, not at a transient fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    SelectorMissing,
    AttributeMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(Price),
    NotFound(NotFoundReason),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid CSS selector '{0}'")]
    Selector(String),

    #[error("attribute value '{value}' is not an integer price")]
    InvalidPrice { value: String },
}

/// Resolves a single price from a single product link.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(
        &self,
        link: &str,
        rule: &ExtractionRule,
    ) -> std::result::Result<FetchOutcome, FetchError>;
}

/// Plain HTTP GET + HTML parse. One request per call, no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PriceSource for HttpFetcher {
    async fn fetch(
        &self,
        link: &str,
        rule: &ExtractionRule,
    ) -> std::result::Result<FetchOutcome, FetchError> {
        let response = self.client.get(link).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        extract_price(&body, rule)
    }
}

/// Reads `rule.attribute` off the first element matching `rule.selector`.
pub fn extract_price(
    document: &str,
    rule: &ExtractionRule,
) -> std::result::Result<FetchOutcome, FetchError> {
    let selector = Selector::parse(&rule.selector)
        .map_err(|_| FetchError::Selector(rule.selector.clone()))?;

    let document = Html::parse_document(document);

    let Some(element) = document.select(&selector).next() else {
        return Ok(FetchOutcome::NotFound(NotFoundReason::SelectorMissing));
    };

    let Some(raw) = element.value().attr(&rule.attribute) else {
        return Ok(FetchOutcome::NotFound(NotFoundReason::AttributeMissing));
    };

    let value = raw.trim();
    value
        .parse::<Price>()
        .map(FetchOutcome::Found)
        .map_err(|_| FetchError::InvalidPrice {
            value: value.to_string(),
        })
}
