use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Shared transport settings for every gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Price widget configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
    #[serde(default = "default_price_url")]
    pub url: String,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

/// Champion catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,

    #[serde(default = "default_catalog_version")]
    pub version: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    /// Keep fetched detail records keyed by champion id.
    #[serde(default)]
    pub cache_details: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "pollboard/0.1 (terminal widgets)".to_string()
}
fn default_price_url() -> String {
    "https://api.coingecko.com/api/v3/coins/bitcoin?localization=false&tickers=false&market_data=true"
        .to_string()
}
fn default_refresh_interval_secs() -> u64 {
    3600
}
fn default_history_capacity() -> usize {
    24
}
fn default_catalog_base_url() -> String {
    "https://ddragon.leagueoflegends.com/cdn".to_string()
}
fn default_catalog_version() -> String {
    "14.1.1".to_string()
}
fn default_locale() -> String {
    "en_US".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            url: default_price_url(),
            refresh_interval_secs: default_refresh_interval_secs(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            version: default_catalog_version(),
            locale: default_locale(),
            cache_details: false,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("POLLBOARD").separator("__"))
            .build()?;

        let app_cfg = match cfg.try_deserialize::<AppConfig>() {
            Ok(c) => c.sanitized(),
            Err(e) => {
                warn!("Invalid configuration ({}), using defaults", e);
                AppConfig::default()
            }
        };
        Ok(app_cfg)
    }

    /// Replace values the widgets cannot run with by their defaults.
    fn sanitized(mut self) -> Self {
        if self.price.refresh_interval_secs == 0 {
            warn!("price.refresh_interval_secs must be positive, using default");
            self.price.refresh_interval_secs = default_refresh_interval_secs();
        }
        if self.price.history_capacity == 0 {
            warn!("price.history_capacity must be positive, using default");
            self.price.history_capacity = default_history_capacity();
        }
        self
    }
}
