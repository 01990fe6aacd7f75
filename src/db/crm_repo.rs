// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Client, Vehicle},
};

const CLIENT_COLUMNS: &str = "id, owner_id, user_id, name, phone, email, tax_id, created_at, updated_at";
const VEHICLE_COLUMNS: &str =
    "id, owner_id, client_id, brand, model, year, plate, color, created_at, updated_at";

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        phone: &str,
        email: &str,
        tax_id: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (owner_id, name, phone, email, tax_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(tax_id)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }

    /// Lista os clientes da oficina. `search` filtra por nome, e-mail, telefone ou documento.
    pub async fn list_clients<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL
                   OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2 OR tax_id ILIKE $2)
            ORDER BY name ASC
            "#
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(executor)
        .await?;

        Ok(clients)
    }

    pub async fn find_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Uuid,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(client_id)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    /// Busca o cliente sem filtro de oficina (convite do portal).
    pub async fn find_client_by_id<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(client_id)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Uuid,
        name: &str,
        phone: &str,
        email: &str,
        tax_id: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = $3, phone = $4, email = $5, tax_id = $6, updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(client_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(tax_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    /// Liga o login do portal ao cliente.
    pub async fn link_client_user<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE clients SET user_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(client_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Remove o cliente (os veículos vão junto). OS e vendas vinculadas bloqueiam a remoção.
    pub async fn delete_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(client_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_write_error(e, "Cliente"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }
        Ok(())
    }

    // =========================================================================
    //  VEÍCULOS
    // =========================================================================

    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Uuid,
        brand: &str,
        model: &str,
        year: i32,
        plate: &str,
        color: &str,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (owner_id, client_id, brand, model, year, plate, color)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(client_id)
        .bind(brand)
        .bind(model)
        .bind(year)
        .bind(plate)
        .bind(color)
        .fetch_one(executor)
        .await?;

        Ok(vehicle)
    }

    pub async fn list_vehicles<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Option<Uuid>,
        search: Option<&str>,
    ) -> Result<Vec<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            SELECT {VEHICLE_COLUMNS}
            FROM vehicles
            WHERE owner_id = $1
              AND ($2::UUID IS NULL OR client_id = $2)
              AND ($3::TEXT IS NULL OR plate ILIKE $3 OR brand ILIKE $3 OR model ILIKE $3)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(client_id)
        .bind(pattern)
        .fetch_all(executor)
        .await?;

        Ok(vehicles)
    }

    pub async fn find_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Option<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(vehicle_id)
        .fetch_optional(executor)
        .await?;

        Ok(vehicle)
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        vehicle_id: Uuid,
        client_id: Uuid,
        brand: &str,
        model: &str,
        year: i32,
        plate: &str,
        color: &str,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles
            SET client_id = $3, brand = $4, model = $5, year = $6, plate = $7, color = $8,
                updated_at = NOW()
            WHERE owner_id = $1 AND id = $2
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(vehicle_id)
        .bind(client_id)
        .bind(brand)
        .bind(model)
        .bind(year)
        .bind(plate)
        .bind(color)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Veículo".into()))
    }

    pub async fn delete_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vehicles WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(vehicle_id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_write_error(e, "Veículo"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Veículo".into()));
        }
        Ok(())
    }
}
