use crate::models::appointment::{
    Appointment, AppointmentFilters, AppointmentStatus, CreateAppointmentRequest,
};
use crate::models::route::RouteStatus;
use crate::utils::errors::{not_found_error, AppError};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: i64 = 200;

pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_routes(&self, route_ids: &[Uuid]) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE route_id = ANY($1)
            ORDER BY scheduled_start ASC, created_at ASC
            "#,
        )
        .bind(route_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    pub async fn find_by_business(
        &self,
        business_id: Uuid,
        filters: &AppointmentFilters,
    ) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE business_id = $1
              AND ($2::appointment_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR technician_id = $3)
            ORDER BY scheduled_start ASC
            LIMIT $4
            "#,
        )
        .bind(business_id)
        .bind(filters.status)
        .bind(filters.technician_id)
        .bind(filters.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(appointment)
    }

    pub async fn create(
        &self,
        business_id: Uuid,
        request: &CreateAppointmentRequest,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (id, business_id, customer_id, service_id, technician_id, scheduled_start,
                                      scheduled_end, status, address, latitude, longitude, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(request.customer_id)
        .bind(request.service_id)
        .bind(request.technician_id)
        .bind(request.scheduled_start)
        .bind(request.scheduled_end)
        .bind(status)
        .bind(&request.address)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(appointment)
    }

    /// Cambia el estado de la cita. Si el técnico arranca (`en_route` o
    /// `in_progress`), su ruta `planned` pasa a `active` en la misma transacción.
    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let appointment =
            sqlx::query_as::<_, Appointment>("UPDATE appointments SET status = $2 WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(status)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| not_found_error("Appointment", &id.to_string()))?;

        if let (true, Some(route_id)) = (status.starts_route(), appointment.route_id) {
            sqlx::query(
                r#"
                UPDATE routes SET status = $2, started_at = COALESCE(started_at, $3)
                WHERE id = $1 AND status = $4
                "#,
            )
            .bind(route_id)
            .bind(RouteStatus::Active)
            .bind(Utc::now())
            .bind(RouteStatus::Planned)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(appointment)
    }
}
