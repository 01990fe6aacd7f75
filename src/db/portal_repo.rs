// src/db/portal_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::portal::PortalOrder};

const PORTAL_SELECT: &str = r#"
    SELECT so.id, so.owner_id, so.os_number, so.status, so.description, so.items, so.total,
           so.status_notes, v.brand AS vehicle_brand, v.model AS vehicle_model, v.plate,
           c.name AS client_name, s.business_name AS workshop_name, so.updated_at
    FROM service_orders so
    JOIN vehicles v ON v.id = so.vehicle_id
    JOIN clients c ON c.id = so.client_id
    LEFT JOIN settings s ON s.owner_id = so.owner_id
"#;

// Consultas públicas do portal do cliente. Sem oficina no contexto:
// o filtro de oficina é opcional e vem do link.
#[derive(Clone)]
pub struct PortalRepository {
    pool: PgPool,
}

impl PortalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// OS do veículo cuja placa confere e cujo dono tem esse documento (ou telefone).
    pub async fn find_by_plate_and_document<'e, E>(
        &self,
        executor: E,
        plate: &str,
        document_digits: &str,
        workshop_id: Option<Uuid>,
    ) -> Result<Vec<PortalOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, PortalOrder>(&format!(
            r#"
            {PORTAL_SELECT}
            WHERE v.plate = $1
              AND v.client_id = so.client_id
              AND (regexp_replace(COALESCE(c.tax_id, ''), '\D', '', 'g') = $2
                   OR regexp_replace(c.phone, '\D', '', 'g') = $2)
              AND ($3::UUID IS NULL OR so.owner_id = $3)
            ORDER BY so.updated_at DESC
            "#
        ))
        .bind(plate)
        .bind(document_digits)
        .bind(workshop_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    /// OS pelo número de exibição (ou pelo id técnico).
    pub async fn find_by_number<'e, E>(
        &self,
        executor: E,
        number: &str,
        workshop_id: Option<Uuid>,
    ) -> Result<Vec<PortalOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, PortalOrder>(&format!(
            r#"
            {PORTAL_SELECT}
            WHERE (so.os_number = $1 OR so.id::TEXT = LOWER($1))
              AND ($2::UUID IS NULL OR so.owner_id = $2)
            ORDER BY so.updated_at DESC
            "#
        ))
        .bind(number)
        .bind(workshop_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Option<PortalOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PortalOrder>(&format!("{PORTAL_SELECT} WHERE so.id = $1"))
            .bind(order_id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }
}
