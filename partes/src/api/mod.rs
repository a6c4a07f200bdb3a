//! REST API for the browser client and the HTTP seeder.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: request/response bodies and query parameters
//!
//! Routes are mounted at the root of the API listener:
//!
//! - `/usuarios`: application users
//! - `/obras`: job sites
//! - `/recursos`: workers and machines
//! - `/tipos-actividad`: activity catalogue
//! - `/actividades`: timed activities, closed through `/actividades/{id}/cierre`
//!
//! Every handler is annotated for `utoipa`; the document is served at
//! `/api-docs/openapi.json` and rendered at `/docs`.

pub mod handlers;
pub mod models;
