//! Remote data gateways: the third-party endpoints both widgets read from.
//!
//! Sources are traits so the widgets can run against in-memory fakes in tests.

pub mod http_client;
pub mod parsers;

use crate::config::{CatalogConfig, PriceConfig};
use crate::models::{CatalogEntry, DetailRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use url::Url;

use self::http_client::HttpClient;
use self::parsers::{parse_catalog, parse_current_price, parse_detail};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Transient fetch failure. Never fatal: callers log it and keep their state.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing or invalid field `{0}`")]
    MissingField(&'static str),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

// ── Source traits ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current USD price, always positive.
    async fn current_price(&self) -> Result<f64, FetchError>;
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn champions(&self) -> Result<Vec<CatalogEntry>, FetchError>;
    async fn champion_detail(&self, id: &str) -> Result<DetailRecord, FetchError>;
}

// ── CoinGecko ─────────────────────────────────────────────────────────────────

pub struct CoinGeckoClient {
    client: HttpClient,
    url: Url,
}

impl CoinGeckoClient {
    pub fn new(client: HttpClient, config: &PriceConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .with_context(|| format!("Invalid price URL {:?}", config.url))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn current_price(&self) -> Result<f64, FetchError> {
        let body = self.client.get_json(self.url.as_str()).await?;
        let price = parse_current_price(&body)?;
        debug!("Current price: {}", price);
        Ok(price)
    }
}

// ── Data Dragon ───────────────────────────────────────────────────────────────

pub struct DataDragonClient {
    client: HttpClient,
    base_url: Url,
    version: String,
    locale: String,
}

impl DataDragonClient {
    pub fn new(client: HttpClient, config: &CatalogConfig) -> Result<Self> {
        // Trailing slash so `join` appends instead of replacing the last segment.
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).with_context(|| format!("Invalid catalog URL {:?}", base))?;

        Ok(Self {
            client,
            base_url,
            version: config.version.clone(),
            locale: config.locale.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path)?)
    }

    /// `{base}/{version}/data/{locale}/champion.json`
    pub fn catalog_url(&self) -> Result<Url, FetchError> {
        self.endpoint(&format!("{}/data/{}/champion.json", self.version, self.locale))
    }

    /// `{base}/{version}/data/{locale}/champion/{id}.json`
    pub fn detail_url(&self, id: &str) -> Result<Url, FetchError> {
        self.endpoint(&format!("{}/data/{}/champion/{}.json", self.version, self.locale, id))
    }

    pub fn champion_icon_url(&self, image_ref: &str) -> Result<Url, FetchError> {
        self.endpoint(&format!("{}/img/champion/{}", self.version, image_ref))
    }

    pub fn splash_url(&self, id: &str) -> Result<Url, FetchError> {
        self.endpoint(&format!("img/champion/splash/{}_0.jpg", id))
    }

    pub fn passive_icon_url(&self, image_ref: &str) -> Result<Url, FetchError> {
        self.endpoint(&format!("{}/img/passive/{}", self.version, image_ref))
    }

    pub fn spell_icon_url(&self, image_ref: &str) -> Result<Url, FetchError> {
        self.endpoint(&format!("{}/img/spell/{}", self.version, image_ref))
    }
}

#[async_trait]
impl CatalogSource for DataDragonClient {
    async fn champions(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let url = self.catalog_url()?;
        let body = self.client.get_json(url.as_str()).await?;
        let entries = parse_catalog(&body)?;
        debug!("Catalog: {} champions", entries.len());
        Ok(entries)
    }

    async fn champion_detail(&self, id: &str) -> Result<DetailRecord, FetchError> {
        let url = self.detail_url(id)?;
        let body = self.client.get_json(url.as_str()).await?;
        parse_detail(&body, id)
    }
}
