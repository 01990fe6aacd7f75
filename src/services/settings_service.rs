// src/services/settings_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::settings::{UpdateSettingsRequest, WorkshopSettings},
};

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository) -> Self {
        Self { repo }
    }

    pub async fn get_settings<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_settings(executor, owner_id).await
    }

    pub async fn save_settings<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = self.repo.upsert_settings(executor, owner_id, input).await?;
        tracing::info!("Configurações da oficina {} atualizadas", owner_id);
        Ok(settings)
    }
}
