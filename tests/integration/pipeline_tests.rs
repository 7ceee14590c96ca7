use super::*;

use price_watcher::config::DiscordConfig;
use price_watcher::{AppConfig, AppError, PriceMonitor};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(price)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_updates_snapshot_and_notifies() -> anyhow::Result<()> {
    let shops = MockServer::start().await;
    mount_page(&shops, "/a/iphone-x", "63990").await;
    mount_page(&shops, "/a/airpods", "12990").await;
    mount_page(&shops, "/b/iphone-x", "65990").await;
    mount_page(&shops, "/b/iphone-8", "44990").await;

    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/token"))
        .and(body_partial_json(serde_json::json!({ "username": "Price Watcher" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&discord)
        .await;

    let dir = tempfile::tempdir()?;
    let snapshot = dir.path().join("prices.csv");
    write_baseline(&snapshot, [64990, 44990, 12990]);

    let base = shops.uri();
    let mut config = get_test_config(
        vec![
            company(
                "Shop A",
                [format!("{base}/a/iphone-x"), String::new(), format!("{base}/a/airpods")],
            ),
            company(
                "Shop B",
                [format!("{base}/b/iphone-x"), format!("{base}/b/iphone-8"), String::new()],
            ),
        ],
        &snapshot,
    );
    config.notifications.discord = DiscordConfig {
        webhook_url: Some(format!("{}/api/webhooks/1/token", discord.uri())),
        ..DiscordConfig::default()
    };
    config.validate()?;

    let monitor = PriceMonitor::from_config(&config)?;
    let report = monitor.run_once().await?;

    assert_eq!(report.resolved_cells, 4);
    assert_eq!(report.unresolved_cells, 2);
    // iPhone X at Shop A is cheaper; iPhone 8 at Shop B and AirPods at Shop A tie.
    assert_eq!(report.undercut_count, 3);
    assert!(report.any_undercut);
    assert_eq!(report.notifications_sent, 2);

    let contents = std::fs::read_to_string(&snapshot)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("Prices as of: "));
    assert_eq!(lines[1], ",iMarket,Shop A,Shop B,Undercut by");
    assert_eq!(lines[2], "Apple iPhone X 64Gb,64990,63990,65990,Shop A");
    assert_eq!(lines[3], "Apple iPhone 8 64Gb,44990,0,44990,Shop B");
    assert_eq!(lines[4], "Apple AirPods,12990,12990,0,Shop A");

    Ok(())
}

#[tokio::test]
async fn test_run_without_undercuts_skips_notifications() -> anyhow::Result<()> {
    let shops = MockServer::start().await;
    mount_page(&shops, "/a/iphone-x", "70000").await;

    let dir = tempfile::tempdir()?;
    let snapshot = dir.path().join("prices.csv");
    write_baseline(&snapshot, [64990, 44990, 12990]);

    let config = get_test_config(
        vec![company(
            "Shop A",
            [format!("{}/a/iphone-x", shops.uri()), String::new(), String::new()],
        )],
        &snapshot,
    );

    let report = PriceMonitor::from_config(&config)?.run_once().await?;

    assert!(!report.any_undercut);
    assert_eq!(report.notifications_sent, 0);
    assert_eq!(report.resolved_cells, 1);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_pages_stay_unresolved() -> anyhow::Result<()> {
    let shops = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&shops)
        .await;

    let dir = tempfile::tempdir()?;
    let snapshot = dir.path().join("prices.csv");
    write_baseline(&snapshot, [64990, 44990, 12990]);

    let config = get_test_config(
        vec![company(
            "Shop A",
            [format!("{}/a/iphone-x", shops.uri()), String::new(), String::new()],
        )],
        &snapshot,
    );

    let report = PriceMonitor::from_config(&config)?.run_once().await?;

    assert_eq!(report.resolved_cells, 0);
    assert_eq!(report.unresolved_cells, 3);
    assert!(!report.any_undercut);
    Ok(())
}

#[tokio::test]
async fn test_missing_baseline_is_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(
        vec![company("Shop A", [String::new(), String::new(), String::new()])],
        &dir.path().join("missing.csv"),
    );

    let err = PriceMonitor::from_config(&config)?.run_once().await.unwrap_err();
    assert!(matches!(err, AppError::Snapshot { .. }));
    Ok(())
}

#[test]
fn test_sample_config_is_valid() {
    let config = AppConfig::load(std::path::Path::new("config/default.toml")).unwrap();
    assert_eq!(config.catalog.len(), 6);
    assert_eq!(config.companies.len(), 2);
    assert!(config.notifications.discord.webhook_url.is_none());
}
