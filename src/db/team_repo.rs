// src/db/team_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::team::{Mechanic, MechanicDraft},
};

const MECHANIC_COLUMNS: &str = "id, owner_id, user_id, name, phone, email, specialty, active, \
    employment_type, base_salary, commission_rate, created_at, updated_at";

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_mechanic<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        user_id: Option<Uuid>,
        draft: &MechanicDraft,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mechanic>(&format!(
            r#"
            INSERT INTO mechanics (
                owner_id, user_id, name, phone, email, specialty, active,
                employment_type, base_salary, commission_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MECHANIC_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.specialty)
        .bind(draft.active)
        .bind(draft.employment_type)
        .bind(draft.base_salary)
        .bind(draft.commission_rate)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_write_error(e, "Mecânico"))
    }

    pub async fn list_mechanics<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Mechanic>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let mechanics = sqlx::query_as::<_, Mechanic>(&format!(
            r#"
            SELECT {MECHANIC_COLUMNS}
            FROM mechanics
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR specialty ILIKE $2)
            ORDER BY name ASC
            "#
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(mechanics)
    }

    pub async fn find_mechanic<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<Option<Mechanic>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mechanic = sqlx::query_as::<_, Mechanic>(&format!(
            "SELECT {MECHANIC_COLUMNS} FROM mechanics WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(mechanic_id)
        .fetch_optional(executor)
        .await?;
        Ok(mechanic)
    }

    pub async fn update_mechanic<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        mechanic_id: Uuid,
        draft: &MechanicDraft,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mechanic>(&format!(
            r#"
            UPDATE mechanics
            SET name = $3, phone = $4, email = $5, specialty = $6, active = $7,
                employment_type = $8, base_salary = $9, commission_rate = $10, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {MECHANIC_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(mechanic_id)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.specialty)
        .bind(draft.active)
        .bind(draft.employment_type)
        .bind(draft.base_salary)
        .bind(draft.commission_rate)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Mecânico".into()))
    }

    pub async fn delete_mechanic<'e, E>(&self, executor: E, owner_id: Uuid, mechanic_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM mechanics WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(mechanic_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Mecânico".into()));
        }
        Ok(())
    }
}
