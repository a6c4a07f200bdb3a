//! Shared fixtures for unit and database-backed tests.

use crate::config::Config;
use crate::{AppState, build_api_router};
use axum_test::TestServer;
use sqlx::{FromRow, PgPool};

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.api.host = "127.0.0.1".to_string();
    config.api.port = 0;
    config.frontend.enabled = false;
    config.database.max_connections = 1;
    config.database.run_migrations = false;
    config.seed.delay = std::time::Duration::ZERO;
    config
}

/// API router over `pool` wrapped in a test server.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    let router = build_api_router(state).expect("Failed to build API router");
    TestServer::new(router).expect("Failed to create test server")
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ColumnShape {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
}

/// Tables, columns and indexes of the `public` schema, for comparing before/after a
/// migration. The migration bookkeeping table is left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub columns: Vec<ColumnShape>,
    pub indexes: Vec<(String, String)>,
}

impl SchemaSnapshot {
    pub async fn capture(pool: &PgPool) -> Self {
        let columns = sqlx::query_as::<_, ColumnShape>(
            r#"
            SELECT table_name::text, column_name::text, data_type::text, is_nullable::text
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name <> '_sqlx_migrations'
            ORDER BY table_name, column_name
            "#,
        )
        .fetch_all(pool)
        .await
        .expect("Failed to read columns");

        let indexes = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT indexname::text, indexdef::text
            FROM pg_indexes
            WHERE schemaname = 'public' AND tablename <> '_sqlx_migrations'
            ORDER BY indexname
            "#,
        )
        .fetch_all(pool)
        .await
        .expect("Failed to read indexes");

        Self { columns, indexes }
    }
}
