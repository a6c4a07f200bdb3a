//! Database repository for actividades.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::actividades::{ActividadCierreDBRequest, ActividadCreateDBRequest, ActividadDBResponse},
};
use crate::types::{ActividadId, ObraId, RecursoId, TipoActividadId, UsuarioId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing actividades
#[derive(Debug, Clone, Default)]
pub struct ActividadFilter {
    pub skip: i64,
    pub limit: i64,
    pub obra_id: Option<ObraId>,
    pub recurso_id: Option<RecursoId>,
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
    pub en_curso: Option<bool>,
}

impl ActividadFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub fn with_obra(mut self, obra_id: ObraId) -> Self {
        self.obra_id = Some(obra_id);
        self
    }

    pub fn with_recurso(mut self, recurso_id: RecursoId) -> Self {
        self.recurso_id = Some(recurso_id);
        self
    }

    /// Restrict to activities starting within `[desde, hasta]`
    pub fn with_rango(mut self, desde: Option<NaiveDate>, hasta: Option<NaiveDate>) -> Self {
        self.desde = desde;
        self.hasta = hasta;
        self
    }

    pub fn with_en_curso(mut self, en_curso: bool) -> Self {
        self.en_curso = Some(en_curso);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Actividad {
    pub id: ActividadId,
    pub obra_id: ObraId,
    pub recurso_id: RecursoId,
    pub tipo_actividad_id: TipoActividadId,
    pub fecha_inicio: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub fecha_fin: Option<NaiveDate>,
    pub hora_fin: Option<NaiveTime>,
    pub usuario_creacion: Option<UsuarioId>,
    pub usuario_modificacion: Option<UsuarioId>,
    pub gps_inicio_lat: Option<f64>,
    pub gps_inicio_lon: Option<f64>,
    pub gps_fin_lat: Option<f64>,
    pub gps_fin_lon: Option<f64>,
    pub km_recorridos: Option<Decimal>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl From<Actividad> for ActividadDBResponse {
    fn from(a: Actividad) -> Self {
        Self {
            id: a.id,
            obra_id: a.obra_id,
            recurso_id: a.recurso_id,
            tipo_actividad_id: a.tipo_actividad_id,
            fecha_inicio: a.fecha_inicio,
            hora_inicio: a.hora_inicio,
            fecha_fin: a.fecha_fin,
            hora_fin: a.hora_fin,
            usuario_creacion: a.usuario_creacion,
            usuario_modificacion: a.usuario_modificacion,
            gps_inicio_lat: a.gps_inicio_lat,
            gps_inicio_lon: a.gps_inicio_lon,
            gps_fin_lat: a.gps_fin_lat,
            gps_fin_lon: a.gps_fin_lon,
            km_recorridos: a.km_recorridos,
            fecha_creacion: a.fecha_creacion,
            fecha_modificacion: a.fecha_modificacion,
        }
    }
}

pub struct Actividades<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Actividades<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Lock an activity row for the rest of the transaction.
    #[instrument(skip(self), err)]
    pub async fn get_for_update(&mut self, id: ActividadId) -> Result<Option<ActividadDBResponse>> {
        let actividad = sqlx::query_as::<_, Actividad>("SELECT * FROM actividades WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(actividad.map(Into::into))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Actividades<'c> {
    type CreateRequest = ActividadCreateDBRequest;
    type UpdateRequest = ActividadCierreDBRequest;
    type Response = ActividadDBResponse;
    type Id = ActividadId;
    type Filter = ActividadFilter;

    #[instrument(skip(self, request), fields(obra_id = request.obra_id, recurso_id = request.recurso_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let actividad = sqlx::query_as::<_, Actividad>(
            r#"
            INSERT INTO actividades (
                obra_id, recurso_id, tipo_actividad_id, fecha_inicio, hora_inicio,
                gps_inicio_lat, gps_inicio_lon, usuario_creacion
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.obra_id)
        .bind(request.recurso_id)
        .bind(request.tipo_actividad_id)
        .bind(request.fecha_inicio)
        .bind(request.hora_inicio)
        .bind(request.gps_inicio_lat)
        .bind(request.gps_inicio_lon)
        .bind(request.usuario_creacion)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(actividad.into())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let actividad = sqlx::query_as::<_, Actividad>("SELECT * FROM actividades WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(actividad.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM actividades WHERE 1=1");

        if let Some(obra_id) = filter.obra_id {
            query.push(" AND obra_id = ");
            query.push_bind(obra_id);
        }

        if let Some(recurso_id) = filter.recurso_id {
            query.push(" AND recurso_id = ");
            query.push_bind(recurso_id);
        }

        if let Some(desde) = filter.desde {
            query.push(" AND fecha_inicio >= ");
            query.push_bind(desde);
        }

        if let Some(hasta) = filter.hasta {
            query.push(" AND fecha_inicio <= ");
            query.push_bind(hasta);
        }

        match filter.en_curso {
            Some(true) => {
                query.push(" AND fecha_fin IS NULL");
            }
            Some(false) => {
                query.push(" AND fecha_fin IS NOT NULL");
            }
            None => {}
        }

        query.push(" ORDER BY fecha_inicio DESC, hora_inicio DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let actividades = query.build_query_as::<Actividad>().fetch_all(&mut *self.db).await?;

        Ok(actividades.into_iter().map(Into::into).collect())
    }

    /// Close an open activity. Returns [`DbError::NotFound`] if the activity does not exist
    /// or has already been closed.
    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let actividad = sqlx::query_as::<_, Actividad>(
            r#"
            UPDATE actividades SET
                fecha_fin = $2,
                hora_fin = $3,
                gps_fin_lat = $4,
                gps_fin_lon = $5,
                km_recorridos = $6,
                usuario_modificacion = $7,
                fecha_modificacion = NOW()
            WHERE id = $1 AND fecha_fin IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.fecha_fin)
        .bind(request.hora_fin)
        .bind(request.gps_fin_lat)
        .bind(request.gps_fin_lon)
        .bind(request.km_recorridos)
        .bind(request.usuario_modificacion)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(actividad.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Obras, Recursos, TiposActividad};
    use crate::db::models::{
        obras::ObraCreateDBRequest, recursos::RecursoCreateDBRequest, tipos_actividad::TipoActividadCreateDBRequest,
    };
    use crate::types::TipoRecurso;
    use sqlx::PgPool;

    async fn fixtures(conn: &mut PgConnection) -> (ObraId, RecursoId, TipoActividadId) {
        let obra = Obras::new(conn)
            .create(&ObraCreateDBRequest {
                codigo: "OB-TEST".to_string(),
                descripcion: "Obra de prueba".to_string(),
                observaciones: None,
            })
            .await
            .unwrap();
        let recurso = Recursos::new(conn)
            .create(&RecursoCreateDBRequest {
                codigo: "MQ900".to_string(),
                nombre: "Retroexcavadora".to_string(),
                tipo: TipoRecurso::Maquina,
                activo: true,
                agr_coste: None,
            })
            .await
            .unwrap();
        let tipo = TiposActividad::new(conn)
            .create(&TipoActividadCreateDBRequest {
                codigo: "EXC".to_string(),
                nombre: "Excavación".to_string(),
                descripcion: None,
            })
            .await
            .unwrap();
        (obra.id, recurso.id, tipo.id)
    }

    fn open_request(obra_id: ObraId, recurso_id: RecursoId, tipo_actividad_id: TipoActividadId) -> ActividadCreateDBRequest {
        ActividadCreateDBRequest {
            obra_id,
            recurso_id,
            tipo_actividad_id,
            fecha_inicio: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            hora_inicio: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            gps_inicio_lat: Some(39.4699),
            gps_inicio_lon: Some(-0.3763),
            usuario_creacion: None,
        }
    }

    fn cierre() -> ActividadCierreDBRequest {
        ActividadCierreDBRequest {
            fecha_fin: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            hora_fin: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            gps_fin_lat: None,
            gps_fin_lon: None,
            km_recorridos: Some(Decimal::new(1250, 2)),
            usuario_modificacion: None,
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_close_only_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let (obra, recurso, tipo) = fixtures(&mut conn).await;
        let mut repo = Actividades::new(&mut conn);

        let abierta = repo.create(&open_request(obra, recurso, tipo)).await.unwrap();
        assert!(abierta.en_curso());

        let cerrada = repo.update(abierta.id, &cierre()).await.unwrap();
        assert!(!cerrada.en_curso());
        assert_eq!(cerrada.km_recorridos, Some(Decimal::new(1250, 2)));

        let err = repo.update(abierta.id, &cierre()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_list_by_date_range_and_state(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let (obra, recurso, tipo) = fixtures(&mut conn).await;
        let mut repo = Actividades::new(&mut conn);

        let primera = repo.create(&open_request(obra, recurso, tipo)).await.unwrap();
        let mut later = open_request(obra, recurso, tipo);
        later.fecha_inicio = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        repo.create(&later).await.unwrap();
        repo.update(primera.id, &cierre()).await.unwrap();

        let abril_inicio = repo
            .list(&ActividadFilter::new(0, 100).with_obra(obra).with_rango(
                NaiveDate::from_ymd_opt(2025, 4, 1),
                NaiveDate::from_ymd_opt(2025, 4, 5),
            ))
            .await
            .unwrap();
        assert_eq!(abril_inicio.len(), 1);
        assert_eq!(abril_inicio[0].id, primera.id);

        let abiertas = repo
            .list(&ActividadFilter::new(0, 100).with_recurso(recurso).with_en_curso(true))
            .await
            .unwrap();
        assert_eq!(abiertas.len(), 1);
        assert_eq!(abiertas[0].fecha_inicio, NaiveDate::from_ymd_opt(2025, 4, 10).unwrap());
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL server at DATABASE_URL"]
    async fn test_unknown_obra_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let (_, recurso, tipo) = fixtures(&mut conn).await;
        let mut repo = Actividades::new(&mut conn);

        let err = repo.create(&open_request(424242, recurso, tipo)).await.unwrap_err();
        match err {
            DbError::ForeignKeyViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("fk_actividades_obra"));
            }
            other => panic!("expected foreign key violation, got {other:?}"),
        }
    }
}
