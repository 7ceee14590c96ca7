use crate::plugins::traits::{Notifier, UndercutAlert};
use crate::utils::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Writes alerts to the tracing output. Always registered.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        LogNotifier
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, alert: &UndercutAlert) -> Result<()> {
        warn!(run_id = %alert.run_id, undercuts = alert.undercuts.len(), "{}", alert.headline());
        for line in alert.lines() {
            info!(run_id = %alert.run_id, "{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new();
        let alert = UndercutAlert {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            baseline_title: "iMarket".to_string(),
            undercuts: vec![],
        };

        assert_eq!(notifier.name(), "log");
        assert!(notifier.notify(&alert).await.is_ok());
    }
}
