use crate::api::models::recursos::{ListRecursosQuery, RecursoCreate, RecursoResponse, RecursoUpdate};
use crate::db::handlers::{Recursos, Repository, recursos::RecursoFilter};
use crate::db::models::recursos::{RecursoCreateDBRequest, RecursoUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::RecursoId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/recursos",
    tag = "recursos",
    summary = "List recursos",
    params(ListRecursosQuery),
    responses(
        (status = 200, description = "List of workers and machines", body = Vec<RecursoResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_recursos(
    State(state): State<AppState>,
    Query(query): Query<ListRecursosQuery>,
) -> Result<Json<Vec<RecursoResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Recursos::new(&mut pool_conn);

    let (skip, limit) = query.pagination.params();
    let mut filter = RecursoFilter::new(skip, limit);
    if let Some(tipo) = query.tipo {
        filter = filter.with_tipo(tipo);
    }
    if let Some(activo) = query.activo {
        filter = filter.with_activo(activo);
    }

    let recursos = repo.list(&filter).await?;
    Ok(Json(recursos.into_iter().map(RecursoResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/recursos",
    tag = "recursos",
    summary = "Create recurso",
    request_body = RecursoCreate,
    responses(
        (status = 201, description = "Recurso created", body = RecursoResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A recurso with this codigo already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_recurso(
    State(state): State<AppState>,
    Json(create): Json<RecursoCreate>,
) -> Result<(StatusCode, Json<RecursoResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Recursos::new(&mut pool_conn);

    let recurso = repo.create(&RecursoCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(RecursoResponse::from(recurso))))
}

#[utoipa::path(
    get,
    path = "/recursos/{id}",
    tag = "recursos",
    summary = "Get recurso",
    params(("id" = i32, Path, description = "Recurso ID")),
    responses(
        (status = 200, description = "Recurso details", body = RecursoResponse),
        (status = 404, description = "Recurso not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_recurso(State(state): State<AppState>, Path(id): Path<RecursoId>) -> Result<Json<RecursoResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Recursos::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(recurso) => Ok(Json(RecursoResponse::from(recurso))),
        None => Err(Error::NotFound {
            resource: "Recurso".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/recursos/{id}",
    tag = "recursos",
    summary = "Update recurso",
    request_body = RecursoUpdate,
    params(("id" = i32, Path, description = "Recurso ID")),
    responses(
        (status = 200, description = "Recurso updated", body = RecursoResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Recurso not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_recurso(
    State(state): State<AppState>,
    Path(id): Path<RecursoId>,
    Json(update): Json<RecursoUpdate>,
) -> Result<Json<RecursoResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Recursos::new(&mut pool_conn);

    let recurso = repo.update(id, &RecursoUpdateDBRequest::from(update)).await?;
    Ok(Json(RecursoResponse::from(recurso)))
}
