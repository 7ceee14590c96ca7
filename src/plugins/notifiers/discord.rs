use crate::plugins::traits::{Notifier, UndercutAlert};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

// Discord rejects embeds with more fields than this.
const MAX_EMBED_FIELDS: usize = 25;
const EMBED_COLOR_WARNING: u32 = 0xff0000;

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        DiscordNotifier {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            username: username.into(),
        }
    }

    fn create_embed(&self, alert: &UndercutAlert) -> serde_json::Value {
        let mut fields: Vec<serde_json::Value> = alert
            .undercuts
            .iter()
            .take(MAX_EMBED_FIELDS)
            .map(|u| {
                json!({
                    "name": format!("🏪 {} · {}", u.company, u.model),
                    "value": format!(
                        "**Theirs:** {}\n**Ours:** {}\n**Gap:** {}",
                        u.competitor,
                        u.baseline,
                        u.difference()
                    ),
                    "inline": true
                })
            })
            .collect();

        let hidden = alert.undercuts.len().saturating_sub(MAX_EMBED_FIELDS);
        if hidden > 0 {
            // Keep room for the overflow note.
            fields.truncate(MAX_EMBED_FIELDS - 1);
            fields.push(json!({
                "name": "…",
                "value": format!("and {} more", hidden + 1),
                "inline": false
            }));
        }

        json!({
            "title": format!("📉 {}", alert.headline()),
            "color": EMBED_COLOR_WARNING,
            "timestamp": alert.generated_at.to_rfc3339(),
            "fields": fields,
            "footer": { "text": format!("Run {}", alert.run_id) }
        })
    }

    fn create_webhook_payload(&self, alert: &UndercutAlert) -> serde_json::Value {
        json!({
            "username": self.username,
            "embeds": [self.create_embed(alert)]
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, alert: &UndercutAlert) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.create_webhook_payload(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification {
                notifier: self.name().to_string(),
                message: format!("webhook returned {}", status),
            });
        }

        Ok(())
    }
}
