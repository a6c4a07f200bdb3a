//! # partes: work-hours and fleet-activity tracking
//!
//! `partes` records which workers and machines (`recursos`) spent time on which job sites
//! (`obras`), doing what (`tipos_actividad`), and when. It ships as one binary with four
//! jobs:
//!
//! - **`migrate`**: apply, revert or list the reversible schema migrations ([`migrate`])
//! - **`seed`**: load the roster of workers and machines, directly, through a command-line
//!   SQL client, or through the REST API of a running server ([`seed`])
//! - **`serve`**: run the REST API ([`api`]) and the static front-end server ([`frontend`])
//!   side by side on two listeners
//! - **`client-config`**: resolve the browser client's `config.json` the same way the front
//!   end does ([`client_config`])
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is PostgreSQL
//! through `sqlx`. Handlers talk to the database through repositories in [`db::handlers`],
//! each wrapping a pooled connection or an open transaction. Configuration is layered with
//! `figment` ([`config`]) and every layer logs through `tracing` ([`telemetry`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use partes::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = partes::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     partes::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod api;
pub mod client_config;
pub mod config;
pub mod db;
pub mod errors;
pub mod frontend;
pub mod migrate;
mod openapi;
pub mod seed;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::{actividades, obras, recursos, tipos_actividad, usuarios};
use crate::config::{CorsOrigin, DatabaseConfig};
use crate::frontend::StaticRoot;
use crate::openapi::ApiDoc;
use axum::http::{self, HeaderValue};
use axum::{
    Json, Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// State shared by the API handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// The embedded schema migrations.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open a connection pool.
#[instrument(skip_all, err)]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.api.cors;

    let allow_origin = if cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the REST API router.
#[instrument(skip_all)]
pub fn build_api_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/usuarios", get(usuarios::list_usuarios).post(usuarios::create_usuario))
        .route("/usuarios/{id}", get(usuarios::get_usuario).patch(usuarios::update_usuario))
        .route("/obras", get(obras::list_obras).post(obras::create_obra))
        .route("/obras/{id}", get(obras::get_obra).patch(obras::update_obra))
        .route("/recursos", get(recursos::list_recursos).post(recursos::create_recurso))
        .route("/recursos/{id}", get(recursos::get_recurso).patch(recursos::update_recurso))
        .route(
            "/tipos-actividad",
            get(tipos_actividad::list_tipos_actividad).post(tipos_actividad::create_tipo_actividad),
        )
        .route(
            "/tipos-actividad/{id}",
            get(tipos_actividad::get_tipo_actividad).patch(tipos_actividad::update_tipo_actividad),
        )
        .route(
            "/actividades",
            get(actividades::list_actividades).post(actividades::create_actividad),
        )
        .route("/actividades/{id}", get(actividades::get_actividad))
        .route("/actividades/{id}/cierre", post(actividades::close_actividad))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Owns the pool and both routers for the lifetime of `serve`.
///
/// 1. [`Application::new`] connects, applies pending migrations (unless
///    `database.run_migrations` is off) and builds the routers
/// 2. [`Application::serve`] binds the API and front-end listeners and runs until the
///    shutdown future resolves
pub struct Application {
    config: Config,
    pool: PgPool,
    api_router: Router,
    frontend_router: Option<Router>,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(api = %config.api_bind_address(), frontend_enabled = config.frontend.enabled, "Starting application");

        let pool = connect(&config.database).await?;
        if config.database.run_migrations {
            migrate::run(&pool).await?;
        }

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let api_router = build_api_router(state)?;

        let frontend_router = if config.frontend.enabled {
            let root = StaticRoot::from_config(&config.frontend);
            let outcome = client_config::load_from_path(root.config_document()).await;
            match &outcome {
                client_config::ConfigOutcome::Loaded(client) => {
                    info!(api_base = %client.api_base, "Front end will call the API at its configured address");
                }
                client_config::ConfigOutcome::FellBackToDefault { config, reason } => {
                    warn!(api_base = %config.api_base, %reason, "Front end has no usable config.json");
                }
            }
            Some(frontend::router(root))
        } else {
            None
        };

        Ok(Self {
            config,
            pool,
            api_router,
            frontend_router,
        })
    }

    /// Serve until `shutdown` resolves, then drain both listeners and close the pool.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();

        let api_addr = self.config.api_bind_address();
        let api_listener = TcpListener::bind(&api_addr).await?;
        info!("API listening on http://{}", api_addr);

        let frontend = match self.frontend_router {
            Some(router) => {
                let addr = self.config.frontend_bind_address();
                let listener = TcpListener::bind(&addr).await?;
                info!(root = %self.config.frontend.root.display(), "Front end listening on http://{}", addr);
                Some((listener, router))
            }
            None => None,
        };

        let trigger = token.clone();
        tokio::spawn(async move {
            shutdown.await;
            trigger.cancel();
        });

        let api = axum::serve(api_listener, self.api_router).with_graceful_shutdown(token.clone().cancelled_owned());
        match frontend {
            Some((listener, router)) => {
                let site = axum::serve(listener, router).with_graceful_shutdown(token.clone().cancelled_owned());
                tokio::try_join!(api.into_future(), site.into_future())?;
            }
            None => api.await?,
        }

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};
    use axum_test::TestServer;
    use sqlx::postgres::PgPoolOptions;

    /// A pool that never connects; enough for routes that don't touch the database.
    fn lazy_state(config: Config) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        AppState::builder().db(pool).config(config).build()
    }

    #[tokio::test]
    async fn test_healthz_and_openapi_document() {
        let server = TestServer::new(build_api_router(lazy_state(create_test_config())).unwrap()).unwrap();

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        health.assert_text("OK");

        let doc: serde_json::Value = server.get("/api-docs/openapi.json").await.json();
        assert!(doc["paths"]["/actividades/{id}/cierre"]["post"].is_object());

        server.get("/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_cors_preflight_on_api() {
        let server = TestServer::new(build_api_router(lazy_state(create_test_config())).unwrap()).unwrap();

        let response = server
            .method(http::Method::OPTIONS, "/recursos")
            .add_header(http::header::ORIGIN, "http://localhost:3000")
            .add_header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }

    #[tokio::test]
    async fn test_cors_restricted_origin() {
        let mut config = create_test_config();
        config.api.cors.allowed_origins = vec![CorsOrigin::Url("https://partes.example.com".parse().unwrap())];
        let server = TestServer::new(build_api_router(lazy_state(config)).unwrap()).unwrap();

        let response = server
            .method(http::Method::OPTIONS, "/recursos")
            .add_header(http::header::ORIGIN, "https://partes.example.com")
            .add_header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .await;

        assert_eq!(
            response.header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "https://partes.example.com"
        );
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_seeded_roster_is_listed(pool: PgPool) {
        let roster = seed::Roster::embedded().unwrap();
        seed::db::seed(&pool, &roster).await.unwrap();

        let server = create_test_app(pool).await;
        let listed: Vec<serde_json::Value> = server.get("/recursos").add_query_param("tipo", "maquina").await.json();
        assert_eq!(listed.len(), 7);
    }
}
