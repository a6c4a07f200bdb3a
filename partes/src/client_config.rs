//! Client configuration: the `config.json` document read by the browser front end and the
//! HTTP seed loader.
//!
//! The document names its active section with `current_environment`:
//!
//! ```json
//! {
//!   "current_environment": "development",
//!   "development": {
//!     "backend":  { "protocol": "http", "host": "localhost", "port": 3002 },
//!     "frontend": { "protocol": "http", "host": "localhost", "port": 3000 }
//!   }
//! }
//! ```
//!
//! Loading never fails. A missing or malformed document resolves to
//! [`ConfigOutcome::FellBackToDefault`], which carries the default URLs together with the
//! reason, so the caller can decide whether the fallback matters.

use reqwest::{
    Method, RequestBuilder,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE: &str = "http://localhost:3002";
pub const DEFAULT_FRONTEND_BASE: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("environment '{0}' is not defined in the config document")]
    MissingEnvironment(String),

    #[error("section '{environment}' is malformed: {source}")]
    MalformedSection {
        environment: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config document: {0}")]
    Read(#[from] std::io::Error),

    #[error("config document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to fetch config document: {0}")]
    Fetch(#[from] reqwest::Error),
}

/// One `{protocol, host, port}` triple. The port may be written as a number or a string.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: String,
    pub host: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub port: u16,
}

impl Endpoint {
    /// `protocol://host:port`, tolerating a trailing `:` on the protocol (`"http:"`).
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol.trim_end_matches(':'), self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSection {
    pub backend: Endpoint,
    pub frontend: Endpoint,
}

/// The raw document. Sections are kept as JSON until selected, so unrelated top-level keys
/// do not stop the active environment from loading.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    pub current_environment: String,
    #[serde(flatten)]
    pub sections: BTreeMap<String, serde_json::Value>,
}

impl ConfigDocument {
    pub fn section(&self, environment: &str) -> Result<EnvironmentSection, ClientConfigError> {
        let raw = self
            .sections
            .get(environment)
            .ok_or_else(|| ClientConfigError::MissingEnvironment(environment.to_string()))?;

        EnvironmentSection::deserialize(raw).map_err(|source| ClientConfigError::MalformedSection {
            environment: environment.to_string(),
            source,
        })
    }
}

/// Resolved base URLs for the API and the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    /// Name of the selected section, `None` for the built-in defaults
    pub environment: Option<String>,
    pub api_base: String,
    pub frontend_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: None,
            api_base: DEFAULT_API_BASE.to_string(),
            frontend_base: DEFAULT_FRONTEND_BASE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_document(document: &ConfigDocument) -> Result<Self, ClientConfigError> {
        let section = document.section(&document.current_environment)?;
        Ok(Self {
            environment: Some(document.current_environment.clone()),
            api_base: section.backend.base_url(),
            frontend_base: section.frontend.base_url(),
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ClientConfigError> {
        let document: ConfigDocument = serde_json::from_slice(bytes)?;
        Self::from_document(&document)
    }
}

/// Result of resolving the client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    Loaded(ClientConfig),
    FellBackToDefault { config: ClientConfig, reason: String },
}

impl ConfigOutcome {
    fn resolve(result: Result<ClientConfig, ClientConfigError>, source: &str) -> Self {
        match result {
            Ok(config) => {
                debug!(source, api_base = %config.api_base, "Loaded client config");
                ConfigOutcome::Loaded(config)
            }
            Err(e) => {
                warn!(source, error = %e, "Falling back to default client config");
                ConfigOutcome::FellBackToDefault {
                    config: ClientConfig::default(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn config(&self) -> &ClientConfig {
        match self {
            ConfigOutcome::Loaded(config) | ConfigOutcome::FellBackToDefault { config, .. } => config,
        }
    }

    pub fn into_config(self) -> ClientConfig {
        match self {
            ConfigOutcome::Loaded(config) | ConfigOutcome::FellBackToDefault { config, .. } => config,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ConfigOutcome::FellBackToDefault { .. })
    }
}

/// Read the document from disk.
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn load_from_path(path: &Path) -> ConfigOutcome {
    let result = match tokio::fs::read(path).await {
        Ok(bytes) => ClientConfig::from_json(&bytes),
        Err(e) => Err(e.into()),
    };
    ConfigOutcome::resolve(result, &path.display().to_string())
}

/// Fetch the document over HTTP.
#[instrument(skip(client))]
pub async fn load_from_url(client: &reqwest::Client, url: &str) -> ConfigOutcome {
    async fn fetch(client: &reqwest::Client, url: &str) -> Result<ClientConfig, ClientConfigError> {
        let bytes = client.get(url).send().await?.error_for_status()?.bytes().await?;
        ClientConfig::from_json(&bytes)
    }

    ConfigOutcome::resolve(fetch(client, url).await, url)
}

/// Load from `location`, fetched when it is an `http(s)://` URL and read from disk otherwise.
pub async fn load(location: &str, client: &reqwest::Client) -> ConfigOutcome {
    if location.starts_with("http://") || location.starts_with("https://") {
        load_from_url(client, location).await
    } else {
        load_from_path(Path::new(location)).await
    }
}

/// Request helper bound to the resolved API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &ClientConfig, http: reqwest::Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            default_headers,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Defaults overlaid with `headers`; a header given by the caller replaces the default.
    pub fn merged_headers(&self, headers: HeaderMap) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        merged.extend(headers);
        merged
    }

    pub fn request(&self, method: Method, path: &str, headers: HeaderMap) -> RequestBuilder {
        self.http.request(method, self.url(path)).headers(self.merged_headers(headers))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        self.request(Method::GET, path, HeaderMap::new())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// POST a JSON body. The response is returned whatever its status.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, reqwest::Error> {
        self.request(Method::POST, path, HeaderMap::new()).json(body).send().await
    }
}
