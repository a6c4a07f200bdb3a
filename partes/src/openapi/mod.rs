//! OpenAPI documentation for the REST API, served at `/api-docs/openapi.json` and rendered
//! at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::types;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Partes API",
        description = "Work-hours and fleet-activity tracking: job sites, workers and machines, and the timed activities recorded against them."
    ),
    paths(
        api::handlers::usuarios::list_usuarios,
        api::handlers::usuarios::create_usuario,
        api::handlers::usuarios::get_usuario,
        api::handlers::usuarios::update_usuario,
        api::handlers::obras::list_obras,
        api::handlers::obras::create_obra,
        api::handlers::obras::get_obra,
        api::handlers::obras::update_obra,
        api::handlers::recursos::list_recursos,
        api::handlers::recursos::create_recurso,
        api::handlers::recursos::get_recurso,
        api::handlers::recursos::update_recurso,
        api::handlers::tipos_actividad::list_tipos_actividad,
        api::handlers::tipos_actividad::create_tipo_actividad,
        api::handlers::tipos_actividad::get_tipo_actividad,
        api::handlers::tipos_actividad::update_tipo_actividad,
        api::handlers::actividades::list_actividades,
        api::handlers::actividades::create_actividad,
        api::handlers::actividades::get_actividad,
        api::handlers::actividades::close_actividad,
    ),
    components(
        schemas(
            types::Rol,
            types::TipoRecurso,
            api::models::usuarios::UsuarioCreate,
            api::models::usuarios::UsuarioUpdate,
            api::models::usuarios::UsuarioResponse,
            api::models::obras::ObraCreate,
            api::models::obras::ObraUpdate,
            api::models::obras::ObraResponse,
            api::models::recursos::RecursoCreate,
            api::models::recursos::RecursoUpdate,
            api::models::recursos::RecursoResponse,
            api::models::tipos_actividad::TipoActividadCreate,
            api::models::tipos_actividad::TipoActividadUpdate,
            api::models::tipos_actividad::TipoActividadResponse,
            api::models::actividades::Coordenadas,
            api::models::actividades::ActividadCreate,
            api::models::actividades::ActividadCierre,
            api::models::actividades::ActividadResponse,
        )
    ),
    tags(
        (name = "usuarios", description = "Application users and their roles"),
        (name = "obras", description = "Job sites"),
        (name = "recursos", description = "Workers and machines"),
        (name = "tipos-actividad", description = "Activity catalogue"),
        (name = "actividades", description = "Timed activity records"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_resource_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/recursos", "/obras", "/usuarios", "/tipos-actividad", "/actividades/{id}/cierre"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
