// src/db/platform_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::platform::WorkshopStats};

#[derive(Clone)]
pub struct PlatformRepository {
    pool: PgPool,
}

impl PlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Contagem de documentos por oficina (um dono = uma oficina).
    pub async fn workshop_stats<'e, E>(&self, executor: E) -> Result<Vec<WorkshopStats>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, WorkshopStats>(
            r#"
            SELECT
                u.id AS owner_id,
                u.name AS owner_name,
                u.email AS owner_email,
                s.business_name,
                (SELECT COUNT(*) FROM clients WHERE owner_id = u.id) AS clients,
                (SELECT COUNT(*) FROM vehicles WHERE owner_id = u.id) AS vehicles,
                (SELECT COUNT(*) FROM service_orders WHERE owner_id = u.id) AS service_orders,
                (SELECT COUNT(*) FROM sales WHERE owner_id = u.id) AS sales,
                (SELECT COUNT(*) FROM products WHERE owner_id = u.id) AS products,
                (SELECT COUNT(*) FROM mechanics WHERE owner_id = u.id) AS mechanics
            FROM users u
            LEFT JOIN settings s ON s.owner_id = u.id
            WHERE u.role = 'ADMIN'
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(stats)
    }
}
