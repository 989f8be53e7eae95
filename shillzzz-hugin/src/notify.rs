/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use shillzzz_gungnir::{Notifier, Result as GungnirResult};

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Posts announcements to a Telegram chat through the bot API.
///
/// Messages are sent from a spawned task; `notify` returns before delivery.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: Secret<String>,
    chat_id: String,
}

impl WebhookNotifier {
    pub fn new(bot_token: Secret<String>, chat_id: &str) -> WebhookNotifier {
        WebhookNotifier::with_api_url(TELEGRAM_API, bot_token, chat_id)
    }

    pub fn with_api_url(api_url: &str, bot_token: Secret<String>, chat_id: &str) -> WebhookNotifier {
        WebhookNotifier {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id: chat_id.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url,
            self.bot_token.expose_secret()
        )
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: String) -> GungnirResult<()> {
        let request = self.client.post(self.endpoint()).json(&json!({
            "chat_id": self.chat_id,
            "text": message,
            "disable_web_page_preview": true,
        }));
        tokio::spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => log::debug!("notification delivered"),
                Err(e) => log::warn!("notification failed: {}", e.without_url()),
            }
        });
        Ok(())
    }
}
