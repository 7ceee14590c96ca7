// Shared fixtures for the integration tests

pub mod fetcher_tests;
pub mod pipeline_tests;

use std::path::Path;

use price_watcher::config::{
    AppConfig, CompanyConfig, LoggingConfig, NotificationsConfig, ScraperConfig, SnapshotConfig,
};

pub const CATALOG: [&str; 3] = ["Apple iPhone X 64Gb", "Apple iPhone 8 64Gb", "Apple AirPods"];

/// A product page carrying its price the way most shops do.
pub fn product_page(price: &str) -> String {
    format!(
        r#"<html><head><meta itemprop="price" content="{}"></head><body></body></html>"#,
        price
    )
}

pub fn get_test_scraper_config() -> ScraperConfig {
    ScraperConfig {
        max_concurrent_fetches: 4,
        retry_attempts: 3,
        retry_delay_ms: 0,
        max_retry_delay_ms: 0,
        request_timeout_secs: 5,
        attempt_timeout_secs: 5,
        user_agent: "PriceWatcher-Test/1.0".to_string(),
    }
}

pub fn get_test_config(companies: Vec<CompanyConfig>, snapshot: &Path) -> AppConfig {
    AppConfig {
        catalog: CATALOG.iter().map(|m| m.to_string()).collect(),
        companies,
        scraper: get_test_scraper_config(),
        snapshot: SnapshotConfig {
            path: snapshot.to_path_buf(),
            ..SnapshotConfig::default()
        },
        notifications: NotificationsConfig::default(),
        logging: LoggingConfig::default(),
    }
}

pub fn company(title: &str, links: [String; 3]) -> CompanyConfig {
    CompanyConfig {
        title: title.to_string(),
        selector: "meta[itemprop=price]".to_string(),
        attribute: "content".to_string(),
        links: links.to_vec(),
    }
}

/// Seed a snapshot whose baseline column holds `prices`.
pub fn write_baseline(path: &Path, prices: [u64; 3]) {
    let mut contents = String::from("Prices as of: 01-10-2026\n,iMarket,Undercut by\n");
    for (model, price) in CATALOG.iter().zip(prices) {
        contents.push_str(&format!("{},{},\n", model, price));
    }
    std::fs::write(path, contents).expect("write baseline snapshot");
}
