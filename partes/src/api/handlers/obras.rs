use crate::api::models::obras::{ListObrasQuery, ObraCreate, ObraResponse, ObraUpdate};
use crate::db::handlers::{Obras, Repository, obras::ObraFilter};
use crate::db::models::obras::{ObraCreateDBRequest, ObraUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::ObraId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/obras",
    tag = "obras",
    summary = "List obras",
    params(ListObrasQuery),
    responses(
        (status = 200, description = "List of job sites", body = Vec<ObraResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_obras(State(state): State<AppState>, Query(query): Query<ListObrasQuery>) -> Result<Json<Vec<ObraResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Obras::new(&mut pool_conn);

    let (skip, limit) = query.pagination.params();
    let mut filter = ObraFilter::new(skip, limit);
    if let Some(activo) = query.activo {
        filter = filter.with_activo(activo);
    }

    let obras = repo.list(&filter).await?;
    Ok(Json(obras.into_iter().map(ObraResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/obras",
    tag = "obras",
    summary = "Create obra",
    request_body = ObraCreate,
    responses(
        (status = 201, description = "Obra created", body = ObraResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "An obra with this codigo already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_obra(State(state): State<AppState>, Json(create): Json<ObraCreate>) -> Result<(StatusCode, Json<ObraResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Obras::new(&mut pool_conn);

    let obra = repo.create(&ObraCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(ObraResponse::from(obra))))
}

#[utoipa::path(
    get,
    path = "/obras/{id}",
    tag = "obras",
    summary = "Get obra",
    params(("id" = i32, Path, description = "Obra ID")),
    responses(
        (status = 200, description = "Obra details", body = ObraResponse),
        (status = 404, description = "Obra not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_obra(State(state): State<AppState>, Path(id): Path<ObraId>) -> Result<Json<ObraResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Obras::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(obra) => Ok(Json(ObraResponse::from(obra))),
        None => Err(Error::NotFound {
            resource: "Obra".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/obras/{id}",
    tag = "obras",
    summary = "Update obra",
    request_body = ObraUpdate,
    params(("id" = i32, Path, description = "Obra ID")),
    responses(
        (status = 200, description = "Obra updated", body = ObraResponse),
        (status = 404, description = "Obra not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_obra(
    State(state): State<AppState>,
    Path(id): Path<ObraId>,
    Json(update): Json<ObraUpdate>,
) -> Result<Json<ObraResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Obras::new(&mut pool_conn);

    let obra = repo.update(id, &ObraUpdateDBRequest::from(update)).await?;
    Ok(Json(ObraResponse::from(obra)))
}
