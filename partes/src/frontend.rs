//! Static file server for the browser front end.
//!
//! Request paths are mapped onto files under a root directory. Unknown paths serve the SPA
//! entry document so client-side routes survive a reload, and `/config.json` is read from
//! the configured client config document (by default next to the root, not inside it).
//! Every other path that leaves the root answers `403 Forbidden`.

use crate::config::FrontendConfig;
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Method, Response, StatusCode, Uri, header},
    response::IntoResponse,
};
use percent_encoding::percent_decode_str;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, instrument, warn};

const CONFIG_DOCUMENT_PATH: &str = "/config.json";
const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const NO_CACHE: &str = "no-cache";

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("path escapes the static root: {0}")]
    Forbidden(String),

    #[error("request path is not valid UTF-8")]
    InvalidPath,

    #[error("SPA entry document {} is missing", .0.display())]
    MissingIndex(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FrontendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FrontendError::Forbidden(_) => StatusCode::FORBIDDEN,
            FrontendError::InvalidPath => StatusCode::BAD_REQUEST,
            FrontendError::MissingIndex(_) => StatusCode::NOT_FOUND,
            FrontendError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            FrontendError::Io { .. } | FrontendError::MissingIndex(_) => error!("Static asset error: {}", self),
            FrontendError::Forbidden(_) | FrontendError::InvalidPath => warn!("Rejected static asset request: {}", self),
        }
        (self.status_code(), self.status_code().canonical_reason().unwrap_or_default()).into_response()
    }
}

/// A file picked for a request, relative to what it was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A file under the root, by relative path
    File(PathBuf),
    /// The client config document
    ConfigDocument,
}

/// Directory served by the front-end listener.
#[derive(Debug, Clone)]
pub struct StaticRoot {
    root: PathBuf,
    index: String,
    config_document: PathBuf,
}

impl StaticRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_document = default_config_document(&root);
        Self {
            root,
            index: "index.html".to_string(),
            config_document,
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_config_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_document = path.into();
        self
    }

    pub fn from_config(config: &FrontendConfig) -> Self {
        let root = Self::new(&config.root).with_index(&config.index);
        match &config.config_document {
            Some(path) => root.with_config_document(path),
            None => root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_document(&self) -> &Path {
        &self.config_document
    }

    /// Map a raw request path onto a file, without touching the filesystem.
    ///
    /// `..` components are resolved lexically; one that climbs above the root is rejected.
    pub fn resolve(&self, request_path: &str) -> Result<Resolved, FrontendError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| FrontendError::InvalidPath)?;

        if decoded == CONFIG_DOCUMENT_PATH {
            return Ok(Resolved::ConfigDocument);
        }

        let mut relative = PathBuf::new();
        for part in decoded.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    if !relative.pop() {
                        return Err(FrontendError::Forbidden(decoded.to_string()));
                    }
                }
                part if part.contains('\0') || Path::new(part).components().any(|c| matches!(c, Component::Prefix(_))) => {
                    return Err(FrontendError::Forbidden(decoded.to_string()));
                }
                part => relative.push(part),
            }
        }

        if relative.as_os_str().is_empty() || decoded.ends_with('/') {
            relative.push(&self.index);
        }

        Ok(Resolved::File(relative))
    }

    /// Read a file under the root, following directories to their index document and
    /// rejecting symlinks that point outside the root.
    async fn read_file(&self, relative: &Path) -> Result<Option<(PathBuf, Vec<u8>)>, FrontendError> {
        let mut relative = relative.to_path_buf();
        let mut candidate = self.root.join(&relative);

        let canonical = match tokio::fs::canonicalize(&candidate).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(FrontendError::Io { path: candidate, source }),
        };
        let canonical_root = tokio::fs::canonicalize(&self.root).await.map_err(|source| FrontendError::Io {
            path: self.root.clone(),
            source,
        })?;
        if !canonical.starts_with(&canonical_root) {
            return Err(FrontendError::Forbidden(relative.display().to_string()));
        }

        let is_dir = tokio::fs::metadata(&canonical).await.map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            relative.push(&self.index);
            candidate = self.root.join(&relative);
        }

        match tokio::fs::read(&candidate).await {
            Ok(bytes) => Ok(Some((relative, bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FrontendError::Io { path: candidate, source }),
        }
    }

    async fn spa_index(&self) -> Result<Response<Body>, FrontendError> {
        let path = self.root.join(&self.index);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(file_response(Path::new(&self.index), bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FrontendError::MissingIndex(path)),
            Err(source) => Err(FrontendError::Io { path, source }),
        }
    }

    #[instrument(skip(self))]
    pub async fn serve(&self, request_path: &str) -> Result<Response<Body>, FrontendError> {
        match self.resolve(request_path)? {
            Resolved::ConfigDocument => match tokio::fs::read(&self.config_document).await {
                Ok(bytes) => Ok(file_response(&self.config_document, bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %self.config_document.display(), "No config document, hitting SPA fallback");
                    self.spa_index().await
                }
                Err(source) => Err(FrontendError::Io {
                    path: self.config_document.clone(),
                    source,
                }),
            },
            Resolved::File(relative) => match self.read_file(&relative).await? {
                Some((served, bytes)) => Ok(file_response(&served, bytes)),
                None => {
                    debug!("Hitting SPA fallback for: {}", request_path);
                    self.spa_index().await
                }
            },
        }
    }
}

fn default_config_document(root: &Path) -> PathBuf {
    match root.parent() {
        Some(parent) => parent.join("config.json"),
        None => PathBuf::from("config.json"),
    }
}

fn file_response(path: &Path, bytes: Vec<u8>) -> Response<Body> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let cache_control = if path.starts_with("assets") { IMMUTABLE } else { NO_CACHE };

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    if let Ok(value) = mime.as_ref().parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static(cache_control));
    response
}

async fn handle(State(root): State<Arc<StaticRoot>>, method: Method, uri: Uri) -> axum::response::Response {
    match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::GET | Method::HEAD => match root.serve(uri.path()).await {
            Ok(response) => response.into_response(),
            Err(e) => e.into_response(),
        },
        _ => (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD, OPTIONS")]).into_response(),
    }
}

/// Router for the front-end listener: every path goes through the static root.
pub fn router(root: StaticRoot) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(Arc::new(root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = "<!doctype html><title>partes</title>";

    /// `<tmp>/dist` is the root, `<tmp>/config.json` and `<tmp>/secret.txt` sit beside it.
    fn fixture() -> (TempDir, StaticRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::create_dir_all(root.join("manual")).unwrap();
        fs::write(root.join("index.html"), INDEX).unwrap();
        fs::write(root.join("assets/app-3f2a.js"), "console.log('partes')").unwrap();
        fs::write(root.join("logo.svg"), "<svg/>").unwrap();
        fs::write(root.join("export.partes"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("manual/index.html"), "manual").unwrap();
        fs::write(dir.path().join("config.json"), r#"{"current_environment":"development"}"#).unwrap();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let static_root = StaticRoot::new(&root);
        (dir, static_root)
    }

    fn server(root: StaticRoot) -> TestServer {
        TestServer::new(router(root)).unwrap()
    }

    fn header_value(response: &axum_test::TestResponse, name: &str) -> Option<String> {
        response.headers().get(name).map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_missing_config_document_falls_back_to_index() {
        let (dir, root) = fixture();
        fs::remove_file(dir.path().join("config.json")).unwrap();

        let response = server(root).get("/config.json").await;
        response.assert_status_ok();
        response.assert_text(INDEX);
        assert_eq!(header_value(&response, "content-type").as_deref(), Some("text/html"));
    }

    #[test]
    fn test_resolve_paths() {
        let (_dir, root) = fixture();
        assert_eq!(root.resolve("/").unwrap(), Resolved::File("index.html".into()));
        assert_eq!(root.resolve("/manual/").unwrap(), Resolved::File("manual/index.html".into()));
        assert_eq!(root.resolve("/a/./b/../c.js").unwrap(), Resolved::File("a/c.js".into()));
        assert_eq!(root.resolve("/config.json").unwrap(), Resolved::ConfigDocument);
        assert_eq!(root.resolve("/%63onfig.json").unwrap(), Resolved::ConfigDocument);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, root) = fixture();
        for path in ["/../secret.txt", "/assets/../../secret.txt", "/%2e%2e/secret.txt", "/..%5csecret.txt"] {
            assert!(
                matches!(root.resolve(path), Err(FrontendError::Forbidden(_))),
                "{path} should be forbidden"
            );
        }
    }

    #[test]
    fn test_config_document_defaults_to_parent_directory() {
        let root = StaticRoot::new("/srv/partes/dist");
        assert_eq!(root.config_document(), Path::new("/srv/partes/config.json"));
    }

    #[tokio::test]
    async fn test_serve_root_returns_index_html() {
        let (_dir, root) = fixture();
        let response = server(root).get("/").await;

        response.assert_status_ok();
        assert_eq!(header_value(&response, "content-type").as_deref(), Some("text/html"));
        assert_eq!(header_value(&response, "cache-control").as_deref(), Some("no-cache"));
        assert_eq!(response.text(), INDEX);
    }

    #[tokio::test]
    async fn test_hashed_assets_have_immutable_cache() {
        let (_dir, root) = fixture();
        let response = server(root).get("/assets/app-3f2a.js").await;

        response.assert_status_ok();
        assert_eq!(header_value(&response, "cache-control").as_deref(), Some(IMMUTABLE));
        assert!(header_value(&response, "content-type").unwrap().contains("javascript"));
    }

    #[tokio::test]
    async fn test_content_type_from_extension() {
        let (_dir, root) = fixture();
        let server = server(root);

        let svg = server.get("/logo.svg").await;
        assert_eq!(header_value(&svg, "content-type").as_deref(), Some("image/svg+xml"));

        let unknown = server.get("/export.partes").await;
        unknown.assert_status_ok();
        assert_eq!(header_value(&unknown, "content-type").as_deref(), Some("application/octet-stream"));
        assert_eq!(unknown.as_bytes().to_vec(), vec![0u8, 1, 2]);
    }

    #[tokio::test]
    async fn test_spa_fallback_for_unknown_routes() {
        let (_dir, root) = fixture();
        let response = server(root).get("/obras/12/actividades").await;

        response.assert_status_ok();
        assert_eq!(header_value(&response, "content-type").as_deref(), Some("text/html"));
        assert_eq!(response.text(), INDEX);
    }

    #[tokio::test]
    async fn test_directory_serves_its_index() {
        let (_dir, root) = fixture();
        let response = server(root).get("/manual").await;

        response.assert_status_ok();
        assert_eq!(response.text(), "manual");
    }

    #[tokio::test]
    async fn test_config_json_comes_from_parent_directory() {
        let (_dir, root) = fixture();
        let response = server(root).get("/config.json").await;

        response.assert_status_ok();
        assert_eq!(header_value(&response, "content-type").as_deref(), Some("application/json"));
        assert!(response.text().contains("current_environment"));
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let (_dir, root) = fixture();
        let response = server(root).get("/%2e%2e/secret.txt").await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert!(!response.text().contains("secret"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_forbidden() {
        let (dir, root) = fixture();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.root().join("leak.txt")).unwrap();

        server(root).get("/leak.txt").await.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = StaticRoot::new(dir.path().join("empty"));

        server(root).get("/anything").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_options_short_circuits_with_cors() {
        let (_dir, root) = fixture();
        let server = server(root);

        let response = server.method(Method::OPTIONS, "/assets/app-3f2a.js").await;
        response.assert_status_ok();
        assert!(response.as_bytes().is_empty());

        let response = server.get("/").add_header("origin", "http://localhost:3000").await;
        assert_eq!(header_value(&response, "access-control-allow-origin").as_deref(), Some("*"));
    }

    #[test]
    fn test_io_errors_are_internal() {
        let err = FrontendError::Io {
            path: PathBuf::from("dist/index.html"),
            source: std::io::Error::from(ErrorKind::PermissionDenied),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
