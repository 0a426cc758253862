use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::DiscordConfig;
use crate::{AppError, Result};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const EMBED_COLOR_IN_STOCK: u32 = 0x2ecc71; // green

/// One notification as handed to the sink by the campaign runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub footer: String,
}

/// Where alert campaigns deliver their notifications. One sink, resolved at
/// process start; each send reports success or failure independently.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_alert(&self, alert: &Alert) -> Result<()>;
}

/// Posts alerts as rich embeds into a single Discord channel via the REST
/// API, authenticated with a bot token.
pub struct DiscordSink {
    client: Client,
    api_base: String,
    token: String,
    channel_id: u64,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(default)]
    name: Option<String>,
}

impl DiscordSink {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_base: DISCORD_API_BASE.to_string(),
            token: config.token.clone(),
            channel_id: config.channel_id,
        })
    }

    /// Points the sink at a different API base; used by tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Looks the channel up once at startup so a bad token or channel id
    /// fails the process before the poll loop starts.
    pub async fn resolve_destination(&self) -> Result<String> {
        let url = format!("{}/channels/{}", self.api_base, self.channel_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("channel lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Notify(format!(
                "channel {} lookup returned {}",
                self.channel_id,
                response.status()
            )));
        }

        let info: ChannelInfo = response
            .json()
            .await
            .map_err(|e| AppError::Notify(format!("channel lookup returned bad JSON: {e}")))?;

        Ok(info.name.unwrap_or_else(|| self.channel_id.to_string()))
    }

    fn build_payload(&self, alert: &Alert) -> serde_json::Value {
        let mut embed = json!({
            "title": alert.title,
            "description": alert.description,
            "color": EMBED_COLOR_IN_STOCK,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "footer": { "text": alert.footer },
        });

        if let Some(image_url) = &alert.image_url {
            embed["image"] = json!({ "url": image_url });
        }

        json!({ "embeds": [embed] })
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn send_alert(&self, alert: &Alert) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, self.channel_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&self.build_payload(alert))
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("message send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Notify(format!(
                "discord returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_sink(api_base: &str) -> DiscordSink {
        DiscordSink::new(&DiscordConfig {
            token: "test-token".to_string(),
            channel_id: 42,
        })
        .unwrap()
        .with_api_base(api_base)
    }

    fn test_alert() -> Alert {
        Alert {
            title: "🚨 Back in stock!".to_string(),
            description: "**Widget X**\n[Open product page](https://shop.example.com/x)"
                .to_string(),
            image_url: Some("https://cdn.example.com/x.png".to_string()),
            footer: "Restock alert 1/10".to_string(),
        }
    }

    #[test]
    fn test_payload_contains_embed_fields() {
        let sink = test_sink("http://unused");
        let payload = sink.build_payload(&test_alert());

        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"].as_str().unwrap(), "🚨 Back in stock!");
        assert!(embed["description"].as_str().unwrap().contains("Widget X"));
        assert_eq!(embed["color"].as_u64().unwrap(), 0x2ecc71);
        assert_eq!(
            embed["image"]["url"].as_str().unwrap(),
            "https://cdn.example.com/x.png"
        );
        assert_eq!(embed["footer"]["text"].as_str().unwrap(), "Restock alert 1/10");
    }

    #[test]
    fn test_payload_omits_image_when_absent() {
        let sink = test_sink("http://unused");
        let mut alert = test_alert();
        alert.image_url = None;

        let payload = sink.build_payload(&alert);
        assert!(payload["embeds"][0].get("image").is_none());
    }

    #[tokio::test]
    async fn test_send_alert_posts_to_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/42/messages"))
            .and(header("authorization", "Bot test-token"))
            .and(body_partial_json(json!({
                "embeds": [{ "title": "🚨 Back in stock!" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = test_sink(&server.uri());
        sink.send_alert(&test_alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_alert_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/42/messages"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let sink = test_sink(&server.uri());
        let result = sink.send_alert(&test_alert()).await;

        assert!(matches!(result, Err(AppError::Notify(_))));
    }

    #[tokio::test]
    async fn test_resolve_destination_returns_channel_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .and(header("authorization", "Bot test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "42", "name": "alerts" })),
            )
            .mount(&server)
            .await;

        let sink = test_sink(&server.uri());
        let name = sink.resolve_destination().await.unwrap();
        assert_eq!(name, "alerts");
    }

    #[tokio::test]
    async fn test_resolve_destination_unknown_channel_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sink = test_sink(&server.uri());
        let result = sink.resolve_destination().await;

        assert!(matches!(result, Err(AppError::Notify(_))));
    }
}
