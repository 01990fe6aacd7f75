// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{DashboardSummary, MonthlyRevenue, RecentOrder},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn get_summary<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente dos números
        let mut tx = executor.begin().await?;

        // A. Clientes
        let clients_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        // B. OS em aberto / andamento
        let active_orders = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM service_orders
            WHERE owner_id = $1 AND status IN ('OPEN', 'IN_PROGRESS', 'WAITING_PARTS')
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        // C. Receita paga dos últimos 7 dias
        let revenue_last_7_days = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM transactions
            WHERE owner_id = $1 AND category = 'INCOME' AND status = 'PAID'
              AND date >= NOW() - INTERVAL '7 days'
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        // D. Estoque baixo
        let low_stock_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE owner_id = $1 AND stock <= min_stock",
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        // E. Receita por mês do ano corrente
        let monthly_revenue = sqlx::query_as::<_, MonthlyRevenue>(
            r#"
            SELECT EXTRACT(MONTH FROM date)::INT AS month, COALESCE(SUM(amount), 0) AS total
            FROM transactions
            WHERE owner_id = $1 AND category = 'INCOME' AND status = 'PAID'
              AND date >= date_trunc('year', NOW())
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        // F. Últimas 5 OS
        let recent_orders = sqlx::query_as::<_, RecentOrder>(
            r#"
            SELECT so.id, so.os_number, c.name AS client_name, v.plate, so.status, so.total, so.created_at
            FROM service_orders so
            JOIN clients c ON c.id = so.client_id
            JOIN vehicles v ON v.id = so.vehicle_id
            WHERE so.owner_id = $1
            ORDER BY so.created_at DESC
            LIMIT 5
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            clients_count,
            active_orders,
            revenue_last_7_days,
            low_stock_count,
            monthly_revenue,
            recent_orders,
        })
    }
}
