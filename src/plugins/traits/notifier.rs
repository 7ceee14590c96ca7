use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comparison::{ComparisonReport, Undercut};
use crate::utils::error::Result;

/// What a notifier is told when a run found at least one undercut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndercutAlert {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub baseline_title: String,
    pub undercuts: Vec<Undercut>,
}

impl UndercutAlert {
    pub fn new(run_id: Uuid, baseline_title: impl Into<String>, report: &ComparisonReport) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            baseline_title: baseline_title.into(),
            undercuts: report.undercuts.clone(),
        }
    }

    pub fn headline(&self) -> String {
        let companies: std::collections::BTreeSet<&str> =
            self.undercuts.iter().map(|u| u.company.as_str()).collect();
        format!(
            "{} competitor price(s) at or below {} across {} compan{}",
            self.undercuts.len(),
            self.baseline_title,
            companies.len(),
            if companies.len() == 1 { "y" } else { "ies" }
        )
    }

    /// One human-readable line per undercut.
    pub fn lines(&self) -> Vec<String> {
        self.undercuts
            .iter()
            .map(|u| {
                format!(
                    "{} at {}: {} vs our {} (-{})",
                    u.model,
                    u.company,
                    u.competitor,
                    u.baseline,
                    u.difference()
                )
            })
            .collect()
    }
}

/// Trait for delivering undercut alerts (log, Discord, etc.)
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, alert: &UndercutAlert) -> Result<()>;
}
