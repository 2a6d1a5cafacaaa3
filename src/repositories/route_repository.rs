use crate::models::route::{
    AppointmentAssignment, NewRoute, Route, RouteSequenceUpdate, RouteStatus, Waypoint,
};
use crate::utils::errors::{not_found_error, AppError};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_technicians(&self, technician_ids: &[Uuid]) -> Result<Vec<Route>, AppError> {
        let routes = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE technician_id = ANY($1) AND status = $2
            ORDER BY route_date DESC, created_at DESC
            "#,
        )
        .bind(technician_ids)
        .bind(RouteStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    pub async fn find_by_business(&self, business_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<Route>, AppError> {
        let routes = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE business_id = $1 AND ($2::date IS NULL OR route_date = $2)
            ORDER BY route_date DESC, created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(route)
    }

    pub async fn find_for_day(&self, technician_id: Uuid, date: NaiveDate) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE technician_id = $1 AND route_date = $2 AND status <> $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(technician_id)
        .bind(date)
        .bind(RouteStatus::Cancelled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn create(&self, new_route: NewRoute) -> Result<Route, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            INSERT INTO routes (id, business_id, technician_id, route_date, status, waypoints, optimization_status, created_at)
            VALUES ($1, $2, $3, $4, 'planned', $5, 'draft', $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_route.business_id)
        .bind(new_route.technician_id)
        .bind(new_route.route_date)
        .bind(Json(Vec::<Waypoint>::new()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn save_sequence(&self, update: RouteSequenceUpdate) -> Result<Route, AppError> {
        let mut conn = self.pool.acquire().await?;
        write_sequence(&mut *conn, update).await
    }

    pub async fn complete(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<Route, AppError> {
        sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes SET status = $2, completed_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(RouteStatus::Completed)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Route", &id.to_string()))
    }

    /// Reasigna la cita y reescribe las secuencias de origen y destino en
    /// una única transacción. La cita y ambas rutas quedan bloqueadas
    /// (`FOR UPDATE`) mientras se calcula la nueva secuencia.
    pub async fn assign_appointment(&self, appointment_id: Uuid, route_id: Uuid) -> Result<Route, AppError> {
        let mut tx = self.pool.begin().await?;

        let current_route_id: Option<Uuid> =
            sqlx::query_scalar("SELECT route_id FROM appointments WHERE id = $1 FOR UPDATE")
                .bind(appointment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| not_found_error("Appointment", &appointment_id.to_string()))?;

        let mut route_ids = vec![route_id];
        route_ids.extend(current_route_id.filter(|id| *id != route_id));

        // Orden fijo por id para no cruzar bloqueos entre asignaciones
        let locked = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&route_ids[..])
            .fetch_all(&mut *tx)
            .await?;

        let target = locked
            .iter()
            .find(|r| r.id == route_id)
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))?;

        if current_route_id == Some(route_id) {
            let route = target.clone();
            tx.commit().await?;
            return Ok(route);
        }

        let previous = current_route_id.and_then(|id| locked.iter().find(|r| r.id == id));
        let assignment = AppointmentAssignment::plan(appointment_id, target, previous)?;

        sqlx::query("UPDATE appointments SET route_id = $2, technician_id = $3 WHERE id = $1")
            .bind(assignment.appointment_id)
            .bind(assignment.target.route_id)
            .bind(assignment.technician_id)
            .execute(&mut *tx)
            .await?;

        if let Some(previous) = assignment.previous {
            write_sequence(&mut *tx, previous).await?;
        }
        let route = write_sequence(&mut *tx, assignment.target).await?;

        tx.commit().await?;
        Ok(route)
    }
}

async fn write_sequence(conn: &mut PgConnection, update: RouteSequenceUpdate) -> Result<Route, AppError> {
    sqlx::query_as::<_, Route>(
        r#"
        UPDATE routes
        SET waypoints = $2, optimization_status = $3, optimized_at = $4,
            total_distance_miles = $5, total_duration_minutes = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(update.route_id)
    .bind(Json(update.waypoints))
    .bind(update.optimization_status)
    .bind(update.optimized_at)
    .bind(update.total_distance_miles)
    .bind(update.total_duration_minutes)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| not_found_error("Route", &update.route_id.to_string()))
}
