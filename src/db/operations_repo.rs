// src/db/operations_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{
        LineItem, OsStatus, Sale, SaleDraft, SaleStatus, SalesReport, ServiceOrder,
        ServiceOrderDraft, ServiceOrderFilter,
    },
};

const ORDER_COLUMNS: &str = "id, owner_id, os_number, client_id, vehicle_id, mechanic_id, status, \
    description, body_lines, items, total, status_notes, print_count, last_printed_at, created_at, updated_at";

const SALE_COLUMNS: &str = "id, owner_id, sale_number, client_id, seller_id, items, subtotal, \
    total_discount, total, status, payment_method, is_installments, installments_count, print_count, \
    last_printed_at, created_at, updated_at";

/// Tabelas que carregam número de exibição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayNumberTable {
    ServiceOrders,
    Sales,
}

impl DisplayNumberTable {
    fn exists_query(self) -> &'static str {
        match self {
            DisplayNumberTable::ServiceOrders => {
                "SELECT EXISTS(SELECT 1 FROM service_orders WHERE os_number = $1)"
            }
            DisplayNumberTable::Sales => "SELECT EXISTS(SELECT 1 FROM sales WHERE sale_number = $1)",
        }
    }
}

#[derive(Clone)]
pub struct OperationsRepository {
    pool: PgPool,
}

impl OperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// O número já está em uso na tabela (em qualquer oficina)?
    pub async fn display_number_exists<'e, E>(
        &self,
        executor: E,
        table: DisplayNumberTable,
        candidate: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(table.exists_query())
            .bind(candidate)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    // =========================================================================
    //  ORDENS DE SERVIÇO
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        os_number: &str,
        draft: &ServiceOrderDraft,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            INSERT INTO service_orders (
                owner_id, os_number, client_id, vehicle_id, mechanic_id, status,
                description, body_lines, items, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(os_number)
        .bind(draft.client_id)
        .bind(draft.vehicle_id)
        .bind(draft.mechanic_id)
        .bind(draft.status)
        .bind(&draft.description)
        .bind(&draft.body_lines)
        .bind(Json(&draft.items))
        .bind(draft.total)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_write_error(e, "Número da OS"))
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        filter: &ServiceOrderFilter,
    ) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM service_orders
            WHERE owner_id = $1
              AND ($2::os_status IS NULL OR status = $2)
              AND ($3::UUID IS NULL OR mechanic_id = $3)
              AND ($4::UUID IS NULL OR client_id = $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(filter.status)
        .bind(filter.mechanic_id)
        .bind(filter.client_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    /// OS de um mecânico em andamento (IN_PROGRESS / WAITING_PARTS).
    pub async fn list_active_orders_of_mechanic<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM service_orders
            WHERE owner_id = $1 AND mechanic_id = $2
              AND status IN ('IN_PROGRESS', 'WAITING_PARTS')
            ORDER BY updated_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(mechanic_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn find_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM service_orders WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// Lê a OS travando a linha até o fim da transação.
    pub async fn lock_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM service_orders WHERE owner_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(owner_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        draft: &ServiceOrderDraft,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            UPDATE service_orders
            SET client_id = $3, vehicle_id = $4, mechanic_id = $5, status = $6,
                description = $7, body_lines = $8, items = $9, total = $10, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(order_id)
        .bind(draft.client_id)
        .bind(draft.vehicle_id)
        .bind(draft.mechanic_id)
        .bind(draft.status)
        .bind(&draft.description)
        .bind(&draft.body_lines)
        .bind(Json(&draft.items))
        .bind(draft.total)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("OS".into()))
    }

    pub async fn set_order_status<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        status: OsStatus,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            UPDATE service_orders SET status = $3, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(order_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("OS".into()))
    }

    /// Número só é gravado se ainda não existir.
    pub async fn set_order_number<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        os_number: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE service_orders SET os_number = $3 WHERE owner_id = $1 AND id = $2 AND os_number IS NULL",
        )
        .bind(owner_id)
        .bind(order_id)
        .bind(os_number)
        .execute(executor)
        .await
        .map_err(|e| AppError::from_write_error(e, "Número da OS"))?;
        Ok(())
    }

    /// Assume uma OS aberta. Só funciona enquanto ela estiver OPEN.
    pub async fn claim_open_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            UPDATE service_orders
            SET status = 'IN_PROGRESS', mechanic_id = $3, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2 AND status = 'OPEN'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(order_id)
        .bind(mechanic_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn set_order_items<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        items: &[LineItem],
        total: Decimal,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            UPDATE service_orders SET items = $3, total = $4, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(order_id)
        .bind(Json(items))
        .bind(total)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("OS".into()))
    }

    /// Decisão do portal: só altera se a OS ainda estiver OPEN (update condicional atômico).
    pub async fn decide_open_order<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        status: OsStatus,
        note: &str,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(&format!(
            r#"
            UPDATE service_orders
            SET status = $2, status_notes = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'OPEN'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(status)
        .bind(note)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn register_order_print<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE service_orders SET print_count = print_count + 1, last_printed_at = NOW()
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_order<'e, E>(&self, executor: E, owner_id: Uuid, order_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_orders WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(order_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("OS".into()));
        }
        Ok(())
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        seller_id: Uuid,
        draft: &SaleDraft,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (
                owner_id, client_id, seller_id, items, subtotal, total_discount, total,
                status, payment_method, is_installments, installments_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(draft.client_id)
        .bind(seller_id)
        .bind(Json(&draft.items))
        .bind(draft.subtotal)
        .bind(draft.total_discount)
        .bind(draft.total)
        .bind(draft.status)
        .bind(draft.payment_method)
        .bind(draft.is_installments)
        .bind(draft.installments_count)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn list_sales<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        status: Option<SaleStatus>,
    ) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE owner_id = $1 AND ($2::sale_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(status)
        .fetch_all(executor)
        .await?;
        Ok(sales)
    }

    pub async fn find_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(sale_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    pub async fn lock_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE owner_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(owner_id)
        .bind(sale_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    pub async fn update_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
        draft: &SaleDraft,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET client_id = $3, items = $4, subtotal = $5, total_discount = $6, total = $7,
                status = $8, payment_method = $9, is_installments = $10, installments_count = $11,
                updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(sale_id)
        .bind(draft.client_id)
        .bind(Json(&draft.items))
        .bind(draft.subtotal)
        .bind(draft.total_discount)
        .bind(draft.total)
        .bind(draft.status)
        .bind(draft.payment_method)
        .bind(draft.is_installments)
        .bind(draft.installments_count)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    pub async fn set_sale_status<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales SET status = $3, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(sale_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    pub async fn set_sale_number<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
        sale_number: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE sales SET sale_number = $3 WHERE owner_id = $1 AND id = $2 AND sale_number IS NULL",
        )
        .bind(owner_id)
        .bind(sale_id)
        .bind(sale_number)
        .execute(executor)
        .await
        .map_err(|e| AppError::from_write_error(e, "Número da venda"))?;
        Ok(())
    }

    pub async fn register_sale_print<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE sales SET print_count = print_count + 1, last_printed_at = NOW()
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(sale_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_sale<'e, E>(&self, executor: E, owner_id: Uuid, sale_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(sale_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Venda".into()));
        }
        Ok(())
    }

    /// Relatório de vendas do período [from, to).
    pub async fn sales_report<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (revenue, sales_count, quotes_count, items_sold) =
            sqlx::query_as::<_, (Decimal, i64, i64, i64)>(
                r#"
                SELECT
                    COALESCE(SUM(total) FILTER (WHERE status = 'FINALIZED'), 0),
                    COUNT(*) FILTER (WHERE status = 'FINALIZED'),
                    COUNT(*) FILTER (WHERE status = 'QUOTE'),
                    COALESCE(SUM((
                        SELECT COALESCE(SUM((i->>'quantity')::BIGINT), 0)
                        FROM jsonb_array_elements(items) AS i
                    )) FILTER (WHERE status = 'FINALIZED'), 0)::BIGINT
                FROM sales
                WHERE owner_id = $1 AND created_at >= $2 AND created_at < $3
                "#,
            )
            .bind(owner_id)
            .bind(from)
            .bind(to)
            .fetch_one(executor)
            .await?;

        Ok(SalesReport { revenue, sales_count, quotes_count, items_sold })
    }
}
