//! Connector entry point
//!
//! Ties the validated config to the stream set, the authenticated HTTP
//! client and the Singer `--about` / `--discover` documents.

use crate::auth::Authenticator;
use crate::catalog::{Catalog, Selection};
use crate::config::TapConfig;
use crate::engine::{MessageWriter, SyncEngine};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::state::StateManager;
use crate::streams::{all_streams, StreamSettings, StreamStrategy};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Production API root
pub const BASE_URL: &str = "https://www.talkable.com/api/v2";

/// Tap name reported by `--about`
pub const TAP_NAME: &str = "tap-talkable";

/// The Talkable tap
#[derive(Debug, Clone)]
pub struct TapTalkable {
    config: TapConfig,
    base_url: String,
    settings: StreamSettings,
}

impl TapTalkable {
    /// Create the tap against the production API
    pub fn new(config: TapConfig) -> Self {
        let settings = StreamSettings::from_config(&config);
        Self {
            config,
            base_url: BASE_URL.to_string(),
            settings,
        }
    }

    /// Point the tap at another API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Pin the run date used to cap date windows
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.settings = self.settings.with_today(today);
        self
    }

    /// Validated tap configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// API root requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Settings shared by every stream
    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Streams in run order
    pub fn streams(&self) -> Vec<Box<dyn StreamStrategy>> {
        all_streams(&self.settings)
    }

    /// HTTP settings for the API: base URL plus the configured user agent
    pub fn http_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder().base_url(&self.base_url);
        match &self.config.user_agent {
            Some(agent) => builder.user_agent(agent),
            None => builder,
        }
        .build()
    }

    /// Client carrying the bearer credential
    pub fn http_client(&self) -> Result<HttpClient> {
        self.client_with(self.http_config())
    }

    /// Client for custom HTTP settings, still carrying the bearer credential
    pub fn client_with(&self, config: HttpClientConfig) -> Result<HttpClient> {
        HttpClient::with_auth(config, Authenticator::for_tap(&self.config))
    }

    /// Catalog of every stream
    pub fn discover(&self) -> Catalog {
        Catalog::discover(&self.streams())
    }

    /// The `--about` document
    pub fn about() -> Value {
        json!({
            "name": TAP_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "capabilities": ["catalog", "state", "discover", "about"],
            "settings": TapConfig::json_schema(),
        })
    }

    /// Engine over the tap's streams
    pub fn engine<W: MessageWriter>(
        &self,
        client: HttpClient,
        state: StateManager,
        selection: Selection,
        writer: W,
    ) -> SyncEngine<W> {
        SyncEngine::new(client, self.streams(), state, writer).with_selection(selection)
    }
}
