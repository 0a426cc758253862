use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub monitor: MonitorConfig,
    pub fetcher: FetcherConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token used for the REST API. Required.
    pub token: String,
    /// Channel the alert campaigns post into. Required.
    pub channel_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Notifications per alert campaign.
    pub alert_count: u32,
    /// Seconds between consecutive notifications within a campaign.
    pub alert_interval: u64,
    /// The inter-cycle wait is drawn from exactly these two values, not the
    /// range between them.
    pub check_interval_min: u64,
    pub check_interval_max: u64,
    /// Fixed pause between products within one cycle.
    pub product_pause: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    pub timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// SQLite database holding the products table, if any.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Management-surface read endpoint returning active products as JSON.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Monitored when neither backend is configured.
    pub default_product_url: String,
    pub default_product_name: String,
}

impl AppConfig {
    /// Loads configuration from environment variables with the `RESTOCK`
    /// prefix (e.g. `RESTOCK_DISCORD__TOKEN`, `RESTOCK_MONITOR__ALERT_COUNT`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("discord.token", "")?
            .set_default("discord.channel_id", 0u64)?
            .set_default("monitor.alert_count", 10u32)?
            .set_default("monitor.alert_interval", 10u64)?
            .set_default("monitor.check_interval_min", 30u64)?
            .set_default("monitor.check_interval_max", 60u64)?
            .set_default("monitor.product_pause", 2u64)?
            .set_default("fetcher.timeout", 15u64)?
            .set_default("fetcher.user_agent", "Mozilla/5.0 (StockChecker)")?
            .set_default(
                "registry.default_product_url",
                "https://www.toylaxy.com/th/product/1227227/product-1227227?category_id=137697",
            )?
            .set_default("registry.default_product_name", "Toylaxy Product")?
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.is_empty() {
            return Err(ConfigError::Message(
                "Discord bot token is required (RESTOCK_DISCORD__TOKEN)".into(),
            ));
        }

        if self.discord.channel_id == 0 {
            return Err(ConfigError::Message(
                "Discord channel id is required (RESTOCK_DISCORD__CHANNEL_ID)".into(),
            ));
        }

        if self.monitor.alert_count == 0 {
            return Err(ConfigError::Message(
                "monitor.alert_count must be greater than 0".into(),
            ));
        }

        if self.monitor.check_interval_min == 0 || self.monitor.check_interval_max == 0 {
            return Err(ConfigError::Message(
                "check intervals must be greater than 0".into(),
            ));
        }

        if self.fetcher.timeout == 0 {
            return Err(ConfigError::Message(
                "fetcher.timeout must be greater than 0".into(),
            ));
        }

        if self.registry.default_product_url.is_empty() {
            return Err(ConfigError::Message(
                "registry.default_product_url must not be empty".into(),
            ));
        }

        Ok(())
    }
}
