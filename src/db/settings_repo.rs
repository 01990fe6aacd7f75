// src/db/settings_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{UpdateSettingsRequest, WorkshopSettings},
};

const SETTINGS_COLUMNS: &str = "owner_id, business_name, tax_id, email, phone, address, logo_url, \
    pix_key, fiscal, automation, updated_at";

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Configuração da oficina. Sem linha gravada, devolve o padrão.
    pub async fn get_settings<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, WorkshopSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| WorkshopSettings::defaults(owner_id)))
    }

    // UPSERT (Insert or Update)
    pub async fn upsert_settings<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, WorkshopSettings>(&format!(
            r#"
            INSERT INTO settings (
                owner_id, business_name, tax_id, email, phone, address, logo_url, pix_key,
                fiscal, automation, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (owner_id)
            DO UPDATE SET
                business_name = EXCLUDED.business_name,
                tax_id = EXCLUDED.tax_id,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                logo_url = EXCLUDED.logo_url,
                pix_key = EXCLUDED.pix_key,
                fiscal = EXCLUDED.fiscal,
                automation = EXCLUDED.automation,
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&input.business_name)
        .bind(&input.tax_id)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.logo_url)
        .bind(&input.pix_key)
        .bind(Json(&input.fiscal))
        .bind(Json(&input.automation))
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
