// src/services/team_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TeamRepository,
    models::team::{Mechanic, MechanicDraft},
};

#[derive(Clone)]
pub struct TeamService {
    repo: TeamRepository,
}

impl TeamService {
    pub fn new(repo: TeamRepository) -> Self {
        Self { repo }
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
        self.repo.list_mechanics(executor, owner_id, search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn get_mechanic<'e, E>(&self, executor: E, owner_id: Uuid, mechanic_id: Uuid) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_mechanic(executor, owner_id, mechanic_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Mecânico".into()))
    }

    /// Cadastro feito pelo dono da oficina (sem login próprio).
    pub async fn create_mechanic<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        draft: &MechanicDraft,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_mechanic(executor, owner_id, None, draft).await
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
        self.repo.update_mechanic(executor, owner_id, mechanic_id, draft).await
    }

    pub async fn delete_mechanic<'e, E>(&self, executor: E, owner_id: Uuid, mechanic_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_mechanic(executor, owner_id, mechanic_id).await
    }
}
