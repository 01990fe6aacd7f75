// src/services/inventory_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        inventory_repo::{CatalogServiceDraft, ProductDraft},
        InventoryRepository,
    },
    models::inventory::{CatalogService, Product},
};

/// SKU é guardado sem espaços e em maiúsculas.
fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_products(executor, owner_id, search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn list_low_stock<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_low_stock(executor, owner_id).await
    }

    pub async fn get_product<'e, E>(&self, executor: E, owner_id: Uuid, product_id: Uuid) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_product(executor, owner_id, product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        mut draft: ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        draft.sku = normalize_sku(&draft.sku);
        let product = self.repo.create_product(executor, owner_id, &draft).await?;
        tracing::info!("Produto {} ({}) cadastrado com estoque {}", product.sku, product.id, product.stock);
        Ok(product)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        mut draft: ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        draft.sku = normalize_sku(&draft.sku);
        self.repo.update_product(executor, owner_id, product_id, &draft).await
    }

    pub async fn delete_product<'e, E>(&self, executor: E, owner_id: Uuid, product_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_product(executor, owner_id, product_id).await
    }

    /// Ajuste manual (entrada positiva, saída negativa). Não deixa o estoque negativo.
    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let (name, stock) = self
            .repo
            .apply_stock_delta(&mut *tx, owner_id, product_id, delta)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

        if stock < 0 {
            return Err(AppError::InsufficientStock(name));
        }

        let product = self
            .repo
            .find_product(&mut *tx, owner_id, product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

        tx.commit().await?;

        if product.is_low_stock() {
            tracing::warn!("Estoque baixo: '{}' com {} un. (mínimo {})", product.name, product.stock, product.min_stock);
        }
        Ok(product)
    }

    // =========================================================================
    //  CATÁLOGO DE SERVIÇOS
    // =========================================================================

    pub async fn list_services<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<CatalogService>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_services(executor, owner_id, search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn get_service<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        service_id: Uuid,
    ) -> Result<CatalogService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_service(executor, owner_id, service_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".into()))
    }

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        draft: &CatalogServiceDraft,
    ) -> Result<CatalogService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_service(executor, owner_id, draft).await
    }

    pub async fn update_service<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        service_id: Uuid,
        draft: &CatalogServiceDraft,
    ) -> Result<CatalogService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.update_service(executor, owner_id, service_id, draft).await
    }

    pub async fn delete_service<'e, E>(&self, executor: E, owner_id: Uuid, service_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_service(executor, owner_id, service_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_is_trimmed_and_upper_cased() {
        assert_eq!(normalize_sku("  oil-001 "), "OIL-001");
    }
}
