use tracing::{debug, error, info};

use super::notifiers::{DiscordNotifier, LogNotifier};
use super::traits::{Notifier, UndercutAlert};
use crate::config::NotificationsConfig;

pub type NotifierBox = Box<dyn Notifier>;

/// Fans an alert out to every registered notifier.
pub struct NotifierManager {
    notifiers: Vec<NotifierBox>,
}

impl NotifierManager {
    pub fn new() -> Self {
        Self { notifiers: Vec::new() }
    }

    /// Log notifier always, Discord when a webhook is configured.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(LogNotifier::new()));

        let webhook = config.discord.webhook_url.as_deref().filter(|u| !u.trim().is_empty());
        if let Some(webhook_url) = webhook {
            let username = config.discord.username.clone();
            manager.register(Box::new(DiscordNotifier::new(webhook_url, username)));
        }

        manager
    }

    pub fn register(&mut self, notifier: NotifierBox) {
        debug!(notifier = notifier.name(), "Registered notifier");
        self.notifiers.push(notifier);
    }

    pub fn names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Send `alert` to every notifier. A failing notifier is logged and
    /// skipped; returns how many succeeded.
    pub async fn notify_all(&self, alert: &UndercutAlert) -> usize {
        let mut delivered = 0;
        for notifier in &self.notifiers {
            match notifier.notify(alert).await {
                Ok(()) => {
                    delivered += 1;
                    record_notification(notifier.name(), "sent");
                }
                Err(e) => {
                    error!(
                        notifier = notifier.name(),
                        error = %e,
                        "Failed to deliver undercut alert"
                    );
                    record_notification(notifier.name(), "failed");
                }
            }
        }
        info!(delivered, total = self.notifiers.len(), "Undercut alert dispatched");
        delivered
    }
}

impl Default for NotifierManager {
    fn default() -> Self {
        Self::new()
    }
}

fn record_notification(notifier: &str, outcome: &'static str) {
    metrics::counter!(
        "price_watcher_notifications_total",
        "notifier" => notifier.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscordConfig;
    use crate::utils::error::{AppError, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct RecordingNotifier {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            if self.fail { "broken" } else { "recording" }
        }

        async fn notify(&self, _alert: &UndercutAlert) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Notification {
                    notifier: "broken".to_string(),
                    message: "unreachable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn alert() -> UndercutAlert {
        UndercutAlert {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            baseline_title: "iMarket".to_string(),
            undercuts: vec![],
        }
    }

    #[test]
    fn test_from_config_without_webhook() {
        let manager = NotifierManager::from_config(&NotificationsConfig::default());
        assert_eq!(manager.names(), vec!["log"]);
    }

    #[test]
    fn test_from_config_with_webhook() {
        let config = NotificationsConfig {
            discord: DiscordConfig {
                webhook_url: Some("https://discord.com/api/webhooks/1/token".to_string()),
                ..DiscordConfig::default()
            },
        };
        let manager = NotifierManager::from_config(&config);
        assert_eq!(manager.names(), vec!["log", "discord"]);
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_stop_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = NotifierManager::new();
        manager.register(Box::new(RecordingNotifier { calls: calls.clone(), fail: true }));
        manager.register(Box::new(RecordingNotifier { calls: calls.clone(), fail: false }));

        let delivered = manager.notify_all(&alert()).await;

        assert_eq!(delivered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
