// src/services/platform_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PlatformRepository, UserRepository},
    models::{auth::User, platform::WorkshopStats},
};

#[derive(Clone)]
pub struct PlatformService {
    repo: PlatformRepository,
    user_repo: UserRepository,
}

impl PlatformService {
    pub fn new(repo: PlatformRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo.list_users(executor).await
    }

    pub async fn set_user_active<'e, E>(&self, executor: E, user_id: Uuid, is_active: bool) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = self.user_repo.set_active(executor, user_id, is_active).await?;
        tracing::info!("Usuário {} agora está {}", user.id, if is_active { "ativo" } else { "inativo" });
        Ok(user)
    }

    pub async fn workshop_stats<'e, E>(&self, executor: E) -> Result<Vec<WorkshopStats>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.workshop_stats(executor).await
    }
}
