use crate::models::technician::{
    CreateTechnicianRequest, CreatedTechnician, Technician, TechnicianAvailability, TechnicianSkill,
};
use crate::utils::errors::AppError;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct TechnicianRepository {
    pool: PgPool,
}

impl TechnicianRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_business(&self, business_id: Uuid) -> Result<Vec<Technician>, AppError> {
        let technicians = sqlx::query_as::<_, Technician>(
            r#"
            SELECT * FROM technicians
            WHERE business_id = $1 AND is_active = TRUE
            ORDER BY last_name, first_name
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(technicians)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>, AppError> {
        let technician = sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(technician)
    }

    /// Alta en una sola transacción: si falla cualquier fila hija no queda
    /// ningún técnico huérfano.
    pub async fn create(
        &self,
        business_id: Uuid,
        request: &CreateTechnicianRequest,
    ) -> Result<CreatedTechnician, AppError> {
        let mut tx = self.pool.begin().await?;

        let technician = sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (id, business_id, first_name, last_name, email, phone, photo_url, status, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'off_duty', TRUE, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.photo_url)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let mut skills = Vec::with_capacity(request.skills.len());
        for skill in &request.skills {
            let row = sqlx::query_as::<_, TechnicianSkill>(
                r#"
                INSERT INTO technician_skills (id, technician_id, service_id, proficiency_level)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(technician.id)
            .bind(skill.service_id)
            .bind(skill.proficiency_level)
            .fetch_one(&mut *tx)
            .await?;
            skills.push(row);
        }

        let mut availability = Vec::with_capacity(request.availability.len());
        for slot in &request.availability {
            let row = sqlx::query_as::<_, TechnicianAvailability>(
                r#"
                INSERT INTO technician_availability (id, technician_id, day_of_week, start_time, end_time)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(technician.id)
            .bind(slot.day_of_week)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .fetch_one(&mut *tx)
            .await?;
            availability.push(row);
        }

        tx.commit().await?;

        Ok(CreatedTechnician {
            technician,
            skills,
            availability,
        })
    }
}
