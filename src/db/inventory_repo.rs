// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{CatalogService, Product},
};

const PRODUCT_COLUMNS: &str =
    "id, owner_id, name, sku, price, cost_price, stock, min_stock, ncm, created_at, updated_at";
const SERVICE_COLUMNS: &str =
    "id, owner_id, name, description, price, category, estimated_time, created_at, updated_at";

/// Campos gravados de um produto.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub stock: i32,
    pub min_stock: i32,
    pub ncm: Option<String>,
}

/// Campos gravados de um serviço do catálogo.
#[derive(Debug, Clone)]
pub struct CatalogServiceDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub estimated_time: Option<String>,
}

fn map_sku_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("products_owner_sku_key") {
            return AppError::SkuAlreadyExists;
        }
    }
    AppError::from_write_error(e, "Produto")
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
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
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR sku ILIKE $2)
            ORDER BY name ASC
            "#
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    /// Produtos no limite ou abaixo do estoque mínimo.
    pub async fn list_low_stock<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE owner_id = $1 AND stock <= min_stock
            ORDER BY stock ASC, name ASC
            "#
        ))
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        draft: &ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (owner_id, name, sku, price, cost_price, stock, min_stock, ncm)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&draft.name)
        .bind(&draft.sku)
        .bind(draft.price)
        .bind(draft.cost_price)
        .bind(draft.stock)
        .bind(draft.min_stock)
        .bind(&draft.ncm)
        .fetch_one(executor)
        .await
        .map_err(map_sku_error)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        draft: &ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $3, sku = $4, price = $5, cost_price = $6, stock = $7, min_stock = $8,
                ncm = $9, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(product_id)
        .bind(&draft.name)
        .bind(&draft.sku)
        .bind(draft.price)
        .bind(draft.cost_price)
        .bind(draft.stock)
        .bind(draft.min_stock)
        .bind(&draft.ncm)
        .fetch_optional(executor)
        .await
        .map_err(map_sku_error)?
        .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn delete_product<'e, E>(&self, executor: E, owner_id: Uuid, product_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(product_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Produto".into()));
        }
        Ok(())
    }

    /// Aplica `delta` ao estoque e devolve (nome, estoque resultante).
    /// `None` quando o produto não existe (foi removido).
    pub async fn apply_stock_delta<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<Option<(String, i32)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, (String, i32)>(
            r#"
            UPDATE products
            SET stock = stock + $3, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING name, stock
            "#,
        )
        .bind(owner_id)
        .bind(product_id)
        .bind(delta)
        .fetch_optional(executor)
        .await?;
        Ok(row)
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
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let services = sqlx::query_as::<_, CatalogService>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR category ILIKE $2)
            ORDER BY name ASC
            "#
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(services)
    }

    pub async fn find_service<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<CatalogService>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, CatalogService>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(service_id)
        .fetch_optional(executor)
        .await?;
        Ok(service)
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
        let service = sqlx::query_as::<_, CatalogService>(&format!(
            r#"
            INSERT INTO services (owner_id, name, description, price, category, estimated_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.category)
        .bind(&draft.estimated_time)
        .fetch_one(executor)
        .await?;
        Ok(service)
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
        sqlx::query_as::<_, CatalogService>(&format!(
            r#"
            UPDATE services
            SET name = $3, description = $4, price = $5, category = $6, estimated_time = $7,
                updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(service_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.category)
        .bind(&draft.estimated_time)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Serviço".into()))
    }

    pub async fn delete_service<'e, E>(&self, executor: E, owner_id: Uuid, service_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM services WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(service_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Serviço".into()));
        }
        Ok(())
    }
}
