use crate::api::models::actividades::{ActividadCierre, ActividadCreate, ActividadResponse, ListActividadesQuery};
use crate::db::handlers::{Actividades, Repository, actividades::ActividadFilter};
use crate::db::models::actividades::{ActividadCierreDBRequest, ActividadCreateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::ActividadId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/actividades",
    tag = "actividades",
    summary = "List actividades",
    description = "Newest first. `desde`/`hasta` bound the start date inclusively.",
    params(ListActividadesQuery),
    responses(
        (status = 200, description = "List of activities", body = Vec<ActividadResponse>),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_actividades(
    State(state): State<AppState>,
    Query(query): Query<ListActividadesQuery>,
) -> Result<Json<Vec<ActividadResponse>>> {
    if let (Some(desde), Some(hasta)) = (query.desde, query.hasta)
        && desde > hasta
    {
        return Err(Error::BadRequest {
            message: format!("desde ({desde}) is after hasta ({hasta})"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Actividades::new(&mut pool_conn);

    let (skip, limit) = query.pagination.params();
    let mut filter = ActividadFilter::new(skip, limit).with_rango(query.desde, query.hasta);
    if let Some(obra_id) = query.obra_id {
        filter = filter.with_obra(obra_id);
    }
    if let Some(recurso_id) = query.recurso_id {
        filter = filter.with_recurso(recurso_id);
    }
    if let Some(en_curso) = query.en_curso {
        filter = filter.with_en_curso(en_curso);
    }

    let actividades = repo.list(&filter).await?;
    Ok(Json(actividades.into_iter().map(ActividadResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/actividades",
    tag = "actividades",
    summary = "Open actividad",
    request_body = ActividadCreate,
    responses(
        (status = 201, description = "Activity opened", body = ActividadResponse),
        (status = 400, description = "Invalid request or unknown obra/recurso/tipo"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_actividad(
    State(state): State<AppState>,
    Json(create): Json<ActividadCreate>,
) -> Result<(StatusCode, Json<ActividadResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Actividades::new(&mut pool_conn);

    let actividad = repo.create(&ActividadCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(ActividadResponse::from(actividad))))
}

#[utoipa::path(
    get,
    path = "/actividades/{id}",
    tag = "actividades",
    summary = "Get actividad",
    params(("id" = i32, Path, description = "Actividad ID")),
    responses(
        (status = 200, description = "Activity details", body = ActividadResponse),
        (status = 404, description = "Activity not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_actividad(State(state): State<AppState>, Path(id): Path<ActividadId>) -> Result<Json<ActividadResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Actividades::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(actividad) => Ok(Json(ActividadResponse::from(actividad))),
        None => Err(Error::NotFound {
            resource: "Actividad".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    post,
    path = "/actividades/{id}/cierre",
    tag = "actividades",
    summary = "Close actividad",
    request_body = ActividadCierre,
    params(("id" = i32, Path, description = "Actividad ID")),
    responses(
        (status = 200, description = "Activity closed", body = ActividadResponse),
        (status = 400, description = "End before start or invalid GPS/distance"),
        (status = 404, description = "Activity not found"),
        (status = 409, description = "Activity already closed"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn close_actividad(
    State(state): State<AppState>,
    Path(id): Path<ActividadId>,
    Json(cierre): Json<ActividadCierre>,
) -> Result<Json<ActividadResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let actividad = {
        let mut repo = Actividades::new(&mut tx);

        let Some(abierta) = repo.get_for_update(id).await? else {
            return Err(Error::NotFound {
                resource: "Actividad".to_string(),
                id: id.to_string(),
            });
        };
        if !abierta.en_curso() {
            return Err(Error::Conflict {
                message: format!("Actividad {id} is already closed"),
            });
        }
        cierre
            .validate_against(abierta.fecha_inicio, abierta.hora_inicio)
            .map_err(|message| Error::BadRequest { message })?;

        repo.update(id, &ActividadCierreDBRequest::from(cierre)).await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(ActividadResponse::from(actividad)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::actividades::ActividadResponse;
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    async fn open_actividad(app: &TestServer) -> ActividadResponse {
        let obra: Value = app
            .post("/obras")
            .json(&json!({"codigo": "OB-01", "descripcion": "Urbanización Las Lomas"}))
            .await
            .json();
        let recurso: Value = app
            .post("/recursos")
            .json(&json!({"codigo": "OP001", "nombre": "Juan Pérez", "tipo": "operario"}))
            .await
            .json();
        let tipo: Value = app
            .post("/tipos-actividad")
            .json(&json!({"codigo": "ENC", "nombre": "Encofrado"}))
            .await
            .json();

        let response = app
            .post("/actividades")
            .json(&json!({
                "obra_id": obra["id"],
                "recurso_id": recurso["id"],
                "tipo_actividad_id": tipo["id"],
                "fecha_inicio": "2025-04-02",
                "hora_inicio": "07:30:00",
                "gps_inicio": {"lat": 39.4699, "lon": -0.3763}
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_close_once_then_conflict(pool: PgPool) {
        let app = create_test_app(pool).await;
        let abierta = open_actividad(&app).await;
        assert!(abierta.en_curso);

        let cierre = json!({"fecha_fin": "2025-04-02", "hora_fin": "15:00:00", "km_recorridos": "12.5"});
        let response = app.post(&format!("/actividades/{}/cierre", abierta.id)).json(&cierre).await;
        response.assert_status_ok();
        let cerrada: ActividadResponse = response.json();
        assert!(!cerrada.en_curso);

        app.post(&format!("/actividades/{}/cierre", abierta.id))
            .json(&cierre)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_close_before_start_is_rejected(pool: PgPool) {
        let app = create_test_app(pool).await;
        let abierta = open_actividad(&app).await;

        app.post(&format!("/actividades/{}/cierre", abierta.id))
            .json(&json!({"fecha_fin": "2025-04-01", "hora_fin": "18:00:00"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let still_open: ActividadResponse = app.get(&format!("/actividades/{}", abierta.id)).await.json();
        assert!(still_open.en_curso);
    }

    #[sqlx::test]
    #[test_log::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_list_open_in_range(pool: PgPool) {
        let app = create_test_app(pool).await;
        let abierta = open_actividad(&app).await;

        let abiertas: Vec<ActividadResponse> = app
            .get("/actividades?en_curso=true&desde=2025-04-01&hasta=2025-04-30")
            .await
            .json();
        assert_eq!(abiertas.len(), 1);
        assert_eq!(abiertas[0].id, abierta.id);

        app.get("/actividades?desde=2025-05-01&hasta=2025-04-01")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_unknown_actividad_is_not_found(pool: PgPool) {
        let app = create_test_app(pool).await;
        app.post("/actividades/4242/cierre")
            .json(&json!({"fecha_fin": "2025-04-02", "hora_fin": "15:00:00"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
