//! Loading the roster of workers and machines into `recursos`.
//!
//! One declarative [`Roster`] feeds three loaders:
//!
//! - [`db`]: upsert by `codigo` through the repository layer, in one transaction (default)
//! - [`sql`]: one multi-row `INSERT` per category piped to a command-line SQL client
//! - [`http`]: one `POST /recursos` per record against a running API, then a summary
//!   read back with `GET /recursos`

pub mod db;
pub mod http;
pub mod roster;
pub mod sql;

pub use roster::Roster;

use crate::client_config::{self, ApiClient, ClientConfig};
use crate::config::Config;
use crate::db::errors::DbError;
use crate::frontend::StaticRoot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Which loader `seed` runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeedVia {
    #[default]
    Db,
    Sql,
    Http,
}

/// What the SQL loader does with a `codigo` that already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Let the unique constraint reject the statement
    Fail,
    /// Overwrite the existing row
    #[default]
    Upsert,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read roster {}: {source}", .path.display())]
    RosterRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("roster is not valid JSON: {0}")]
    RosterParse(#[from] serde_json::Error),

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {output}", .status.map(|s| s.to_string()).unwrap_or_else(|| "a signal".to_string()))]
    Client {
        program: String,
        status: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("request to the API failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One record the loader could not store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub codigo: String,
    /// HTTP status, if the server answered
    pub status: Option<u16>,
    pub message: String,
}

/// Per-record outcome of a loader run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} attempted, {} succeeded, {} failed",
            self.attempted,
            self.succeeded,
            self.failed.len()
        )?;
        for failure in &self.failed {
            match failure.status {
                Some(status) => writeln!(f, "  {} ({status}): {}", failure.codigo, failure.message)?,
                None => writeln!(f, "  {}: {}", failure.codigo, failure.message)?,
            }
        }
        Ok(())
    }
}

/// Result of `seed`: the report plus, for the HTTP loader, what the API holds afterwards.
///
/// A summary that could not be read back carries the error text; the report still stands.
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub report: SeedReport,
    pub summary: Option<Result<http::RosterSummary, String>>,
}

/// Where the HTTP loader finds the API.
pub async fn resolve_api(config: &Config) -> ClientConfig {
    if let Some(api_url) = &config.seed.api_url {
        return ClientConfig {
            environment: None,
            api_base: api_url.clone(),
            ..ClientConfig::default()
        };
    }

    let location = match &config.seed.client_document {
        Some(location) => location.clone(),
        None => StaticRoot::from_config(&config.frontend)
            .config_document()
            .display()
            .to_string(),
    };
    client_config::load(&location, &reqwest::Client::new()).await.into_config()
}

/// Load the configured roster with the configured loader.
#[instrument(skip_all, fields(via = ?config.seed.via))]
pub async fn run(config: &Config) -> Result<SeedOutcome, SeedError> {
    let roster = match &config.seed.file {
        Some(path) => Roster::from_path(path).await?,
        None => Roster::embedded()?,
    };
    info!(records = roster.len(), "Loaded roster");

    let outcome = match config.seed.via {
        SeedVia::Db => {
            let pool = crate::connect(&config.database).await.map_err(DbError::from)?;
            SeedOutcome {
                report: db::seed(&pool, &roster).await?,
                summary: None,
            }
        }
        SeedVia::Sql => {
            let client = sql::SqlClient::from_config(&config.seed.sql_client, &config.database.url);
            SeedOutcome {
                report: sql::seed(&client, &roster, config.seed.on_conflict).await?,
                summary: None,
            }
        }
        SeedVia::Http => {
            let api = ApiClient::new(&resolve_api(config).await);
            info!(api_base = api.api_base(), "Seeding through the API");
            let report = http::seed(&api, &roster, config.seed.delay).await;
            let summary = http::summarize(&api).await.map_err(|e| {
                warn!(error = %e, "Could not read back the roster summary");
                e.to_string()
            });
            SeedOutcome {
                report,
                summary: Some(summary),
            }
        }
    };

    if outcome.report.is_success() {
        info!(succeeded = outcome.report.succeeded, "Roster loaded");
    } else {
        warn!(
            succeeded = outcome.report.succeeded,
            failed = outcome.report.failed.len(),
            "Roster loaded with failures"
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_lists_failures() {
        let report = SeedReport {
            attempted: 3,
            succeeded: 2,
            failed: vec![SeedFailure {
                codigo: "MQ003".to_string(),
                status: Some(409),
                message: "already exists".to_string(),
            }],
        };
        let text = report.to_string();
        assert!(text.starts_with("3 attempted, 2 succeeded, 1 failed"));
        assert!(text.contains("MQ003 (409): already exists"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_client_error_message() {
        let err = SeedError::Client {
            program: "psql".to_string(),
            status: Some(3),
            output: "duplicate key".to_string(),
        };
        assert_eq!(err.to_string(), "psql exited with 3: duplicate key");
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_summary_keeps_the_report() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recursos"))
            .respond_with(ResponseTemplate::new(201))
            .expect(19)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/recursos"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.seed.via = SeedVia::Http;
        config.seed.api_url = Some(server.uri());
        config.seed.delay = std::time::Duration::ZERO;

        let outcome = run(&config).await.unwrap();
        assert_eq!(outcome.report.attempted, 19);
        assert_eq!(outcome.report.succeeded, 19);
        assert!(outcome.report.is_success());
        assert!(matches!(outcome.summary, Some(Err(_))));
    }

    #[tokio::test]
    async fn test_explicit_api_url_skips_the_document() {
        let mut config = Config::default();
        config.seed.api_url = Some("http://api.internal:8002".to_string());
        config.seed.client_document = Some("/nonexistent/config.json".to_string());

        assert_eq!(resolve_api(&config).await.api_base, "http://api.internal:8002");
    }

    #[tokio::test]
    async fn test_missing_document_uses_default_api() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.frontend.root = dir.path().join("dist");

        assert_eq!(resolve_api(&config).await.api_base, client_config::DEFAULT_API_BASE);
    }
}
