// src/services/finance_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FinanceRepository,
    models::finance::{
        FinancialSummary, FinancialTransaction, NewTransaction, TransactionCategory, TransactionFilter,
        TransactionStatus,
    },
};

/// Campos de um lançamento manual.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub label: String,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
}

impl FinanceService {
    pub fn new(repo: FinanceRepository) -> Self {
        Self { repo }
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
        self.repo.list_transactions(executor, owner_id, filter).await
    }

    pub async fn get_transaction<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<FinancialTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_transaction(executor, owner_id, transaction_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lançamento".into()))
    }

    /// Lançamento manual: nunca vinculado a OS ou venda.
    pub async fn create_manual<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        entry: ManualEntry,
    ) -> Result<FinancialTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewTransaction {
            label: entry.label.trim().to_string(),
            category: entry.category,
            amount: entry.amount,
            status: entry.status,
            payment_method: entry.payment_method,
            service_order_id: None,
            sale_id: None,
            date: entry.date.unwrap_or_else(Utc::now),
        };
        self.repo.insert_transaction(executor, owner_id, &new).await
    }

    pub async fn update_manual<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        transaction_id: Uuid,
        entry: ManualEntry,
    ) -> Result<FinancialTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let current = self.get_transaction(&mut *conn, owner_id, transaction_id).await?;
        if current.is_linked() {
            return Err(AppError::LinkedTransactionImmutable);
        }

        self.repo
            .update_manual_transaction(
                &mut *conn,
                owner_id,
                transaction_id,
                entry.label.trim(),
                entry.category,
                entry.amount,
                entry.status,
                entry.payment_method.as_deref(),
                entry.date.unwrap_or(current.date),
            )
            .await?
            .ok_or(AppError::LinkedTransactionImmutable)
    }

    pub async fn delete_manual<'e, E>(&self, executor: E, owner_id: Uuid, transaction_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let current = self.get_transaction(&mut *conn, owner_id, transaction_id).await?;
        if current.is_linked() {
            return Err(AppError::LinkedTransactionImmutable);
        }

        if !self.repo.delete_manual_transaction(&mut *conn, owner_id, transaction_id).await? {
            return Err(AppError::LinkedTransactionImmutable);
        }
        Ok(())
    }

    pub async fn summary<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<FinancialSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.summary(executor, owner_id).await
    }

    pub async fn list_recent<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FinancialTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_recent(executor, owner_id, limit).await
    }
}
