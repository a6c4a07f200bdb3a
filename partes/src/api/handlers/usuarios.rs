use crate::api::models::usuarios::{ListUsuariosQuery, UsuarioCreate, UsuarioResponse, UsuarioUpdate};
use crate::db::handlers::{Repository, Usuarios, usuarios::UsuarioFilter};
use crate::db::models::usuarios::{UsuarioCreateDBRequest, UsuarioUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::UsuarioId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "usuarios",
    summary = "List usuarios",
    params(ListUsuariosQuery),
    responses(
        (status = 200, description = "List of application users", body = Vec<UsuarioResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_usuarios(
    State(state): State<AppState>,
    Query(query): Query<ListUsuariosQuery>,
) -> Result<Json<Vec<UsuarioResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Usuarios::new(&mut pool_conn);

    let (skip, limit) = query.pagination.params();
    let mut filter = UsuarioFilter::new(skip, limit);
    if let Some(rol) = query.rol {
        filter = filter.with_rol(rol);
    }
    if let Some(activo) = query.activo {
        filter = filter.with_activo(activo);
    }

    let usuarios = repo.list(&filter).await?;
    Ok(Json(usuarios.into_iter().map(UsuarioResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/usuarios",
    tag = "usuarios",
    summary = "Create usuario",
    request_body = UsuarioCreate,
    responses(
        (status = 201, description = "Usuario created", body = UsuarioResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A usuario with this email already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_usuario(
    State(state): State<AppState>,
    Json(create): Json<UsuarioCreate>,
) -> Result<(StatusCode, Json<UsuarioResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Usuarios::new(&mut pool_conn);

    let usuario = repo.create(&UsuarioCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(UsuarioResponse::from(usuario))))
}

#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    tag = "usuarios",
    summary = "Get usuario",
    params(("id" = i32, Path, description = "Usuario ID")),
    responses(
        (status = 200, description = "Usuario details", body = UsuarioResponse),
        (status = 404, description = "Usuario not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_usuario(State(state): State<AppState>, Path(id): Path<UsuarioId>) -> Result<Json<UsuarioResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Usuarios::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(usuario) => Ok(Json(UsuarioResponse::from(usuario))),
        None => Err(Error::NotFound {
            resource: "Usuario".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/usuarios/{id}",
    tag = "usuarios",
    summary = "Update usuario",
    request_body = UsuarioUpdate,
    params(("id" = i32, Path, description = "Usuario ID")),
    responses(
        (status = 200, description = "Usuario updated", body = UsuarioResponse),
        (status = 404, description = "Usuario not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_usuario(
    State(state): State<AppState>,
    Path(id): Path<UsuarioId>,
    Json(update): Json<UsuarioUpdate>,
) -> Result<Json<UsuarioResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Usuarios::new(&mut pool_conn);

    let usuario = repo.update(id, &UsuarioUpdateDBRequest::from(update)).await?;
    Ok(Json(UsuarioResponse::from(usuario)))
}
