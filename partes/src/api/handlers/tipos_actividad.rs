use crate::api::models::tipos_actividad::{ListTiposActividadQuery, TipoActividadCreate, TipoActividadResponse, TipoActividadUpdate};
use crate::db::handlers::{Repository, TiposActividad, tipos_actividad::TipoActividadFilter};
use crate::db::models::tipos_actividad::{TipoActividadCreateDBRequest, TipoActividadUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::TipoActividadId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/tipos-actividad",
    tag = "tipos-actividad",
    summary = "List tipos de actividad",
    params(ListTiposActividadQuery),
    responses(
        (status = 200, description = "Activity catalogue", body = Vec<TipoActividadResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tipos_actividad(
    State(state): State<AppState>,
    Query(query): Query<ListTiposActividadQuery>,
) -> Result<Json<Vec<TipoActividadResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TiposActividad::new(&mut pool_conn);

    let (skip, limit) = query.pagination.params();
    let tipos = repo.list(&TipoActividadFilter::new(skip, limit)).await?;
    Ok(Json(tipos.into_iter().map(TipoActividadResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tipos-actividad",
    tag = "tipos-actividad",
    summary = "Create tipo de actividad",
    request_body = TipoActividadCreate,
    responses(
        (status = 201, description = "Tipo de actividad created", body = TipoActividadResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A tipo de actividad with this codigo already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_tipo_actividad(
    State(state): State<AppState>,
    Json(create): Json<TipoActividadCreate>,
) -> Result<(StatusCode, Json<TipoActividadResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TiposActividad::new(&mut pool_conn);

    let tipo = repo.create(&TipoActividadCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(TipoActividadResponse::from(tipo))))
}

#[utoipa::path(
    get,
    path = "/tipos-actividad/{id}",
    tag = "tipos-actividad",
    summary = "Get tipo de actividad",
    params(("id" = i32, Path, description = "Tipo de actividad ID")),
    responses(
        (status = 200, description = "Tipo de actividad details", body = TipoActividadResponse),
        (status = 404, description = "Tipo de actividad not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_tipo_actividad(
    State(state): State<AppState>,
    Path(id): Path<TipoActividadId>,
) -> Result<Json<TipoActividadResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TiposActividad::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(tipo) => Ok(Json(TipoActividadResponse::from(tipo))),
        None => Err(Error::NotFound {
            resource: "Tipo de actividad".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/tipos-actividad/{id}",
    tag = "tipos-actividad",
    summary = "Update tipo de actividad",
    request_body = TipoActividadUpdate,
    params(("id" = i32, Path, description = "Tipo de actividad ID")),
    responses(
        (status = 200, description = "Tipo de actividad updated", body = TipoActividadResponse),
        (status = 404, description = "Tipo de actividad not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_tipo_actividad(
    State(state): State<AppState>,
    Path(id): Path<TipoActividadId>,
    Json(update): Json<TipoActividadUpdate>,
) -> Result<Json<TipoActividadResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TiposActividad::new(&mut pool_conn);

    let tipo = repo.update(id, &TipoActividadUpdateDBRequest::from(update)).await?;
    Ok(Json(TipoActividadResponse::from(tipo)))
}
