// src/db/finance_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{
        FinancialSummary, FinancialTransaction, NewTransaction, TransactionCategory,
        TransactionFilter, TransactionStatus,
    },
};

const TRANSACTION_COLUMNS: &str = "id, owner_id, label, category, amount, status, payment_method, \
    service_order_id, sale_id, date, created_at";

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  LANÇAMENTOS
    // =========================================================================

    pub async fn insert_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        entry: &NewTransaction,
    ) -> Result<FinancialTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tx = sqlx::query_as::<_, FinancialTransaction>(&format!(
            r#"
            INSERT INTO transactions (
                owner_id, label, category, amount, status, payment_method,
                service_order_id, sale_id, date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&entry.label)
        .bind(entry.category)
        .bind(entry.amount)
        .bind(entry.status)
        .bind(&entry.payment_method)
        .bind(entry.service_order_id)
        .bind(entry.sale_id)
        .bind(entry.date)
        .fetch_one(executor)
        .await?;

        Ok(tx)
    }

    pub async fn list_transactions<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinancialTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let txs = sqlx::query_as::<_, FinancialTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE owner_id = $1
              AND ($2::transaction_category IS NULL OR category = $2)
              AND ($3::transaction_status IS NULL OR status = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR date >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR date < $5)
            ORDER BY date DESC
            "#
        ))
        .bind(owner_id)
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(executor)
        .await?;

        Ok(txs)
    }

    /// Últimos lançamentos (usados no relatório da IA).
    pub async fn list_recent<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FinancialTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let txs = sqlx::query_as::<_, FinancialTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE owner_id = $1 ORDER BY date DESC LIMIT $2"
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(txs)
    }

    pub async fn find_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<FinancialTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tx = sqlx::query_as::<_, FinancialTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(transaction_id)
        .fetch_optional(executor)
        .await?;
        Ok(tx)
    }

    /// Atualiza um lançamento manual. Lançamentos vinculados não casam com o WHERE.
    pub async fn update_manual_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        transaction_id: Uuid,
        label: &str,
        category: TransactionCategory,
        amount: Decimal,
        status: TransactionStatus,
        payment_method: Option<&str>,
        date: DateTime<Utc>,
    ) -> Result<Option<FinancialTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tx = sqlx::query_as::<_, FinancialTransaction>(&format!(
            r#"
            UPDATE transactions
            SET label = $3, category = $4, amount = $5, status = $6, payment_method = $7, date = $8
            WHERE owner_id = $1 AND id = $2
              AND service_order_id IS NULL AND sale_id IS NULL
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(transaction_id)
        .bind(label)
        .bind(category)
        .bind(amount)
        .bind(status)
        .bind(payment_method)
        .bind(date)
        .fetch_optional(executor)
        .await?;
        Ok(tx)
    }

    pub async fn delete_manual_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM transactions
            WHERE owner_id = $1 AND id = $2
              AND service_order_id IS NULL AND sale_id IS NULL
            "#,
        )
        .bind(owner_id)
        .bind(transaction_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Quantos lançamentos de receita existem para a OS (usado pelos testes de idempotência).
    pub async fn count_for_order<'e, E>(&self, executor: E, order_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transactions WHERE service_order_id = $1",
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn count_for_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions WHERE sale_id = $1")
            .bind(sale_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // =========================================================================
    //  RESUMO
    // =========================================================================

    pub async fn summary<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<FinancialSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (revenue, costs, pending) = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE category = 'INCOME' AND status = 'PAID'), 0),
                COALESCE(SUM(amount) FILTER (WHERE category = 'EXPENSE' AND status = 'PAID'), 0),
                COALESCE(SUM(amount) FILTER (WHERE category = 'INCOME' AND status = 'PENDING'), 0)
            FROM transactions
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(executor)
        .await?;

        Ok(FinancialSummary { revenue, costs, profit: revenue - costs, pending })
    }
}
