// src/services/crm_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::crm::{normalize_plate, Client, Vehicle},
};

/// Dados de um veículo (cadastro avulso ou junto com o cliente).
#[derive(Debug, Clone)]
pub struct VehicleFields {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub color: String,
}

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_clients<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_clients(executor, owner_id, search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn get_client<'e, E>(&self, executor: E, owner_id: Uuid, client_id: Uuid) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_client(executor, owner_id, client_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    /// Cria o cliente e, opcionalmente, o primeiro veículo na mesma transação.
    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        phone: &str,
        email: &str,
        tax_id: Option<&str>,
        first_vehicle: Option<&VehicleFields>,
    ) -> Result<(Client, Option<Vehicle>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let client = self
            .repo
            .create_client(&mut *tx, owner_id, name.trim(), phone.trim(), email.trim(), tax_id)
            .await?;

        let vehicle = match first_vehicle {
            Some(v) => Some(
                self.repo
                    .create_vehicle(
                        &mut *tx,
                        owner_id,
                        client.id,
                        v.brand.trim(),
                        v.model.trim(),
                        v.year,
                        &normalize_plate(&v.plate),
                        v.color.trim(),
                    )
                    .await?,
            ),
            None => None,
        };

        tx.commit().await?;
        Ok((client, vehicle))
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
        self.repo
            .update_client(executor, owner_id, client_id, name.trim(), phone.trim(), email.trim(), tax_id)
            .await
    }

    pub async fn delete_client<'e, E>(&self, executor: E, owner_id: Uuid, client_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_client(executor, owner_id, client_id).await
    }

    // =========================================================================
    //  VEÍCULOS
    // =========================================================================

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
        self.repo
            .list_vehicles(executor, owner_id, client_id, search.filter(|s| !s.trim().is_empty()))
            .await
    }

    pub async fn get_vehicle<'e, E>(&self, executor: E, owner_id: Uuid, vehicle_id: Uuid) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_vehicle(executor, owner_id, vehicle_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Veículo".into()))
    }

    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        client_id: Uuid,
        fields: &VehicleFields,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if self.repo.find_client(&mut *conn, owner_id, client_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }

        self.repo
            .create_vehicle(
                &mut *conn,
                owner_id,
                client_id,
                fields.brand.trim(),
                fields.model.trim(),
                fields.year,
                &normalize_plate(&fields.plate),
                fields.color.trim(),
            )
            .await
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        vehicle_id: Uuid,
        client_id: Uuid,
        fields: &VehicleFields,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if self.repo.find_client(&mut *conn, owner_id, client_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }

        self.repo
            .update_vehicle(
                &mut *conn,
                owner_id,
                vehicle_id,
                client_id,
                fields.brand.trim(),
                fields.model.trim(),
                fields.year,
                &normalize_plate(&fields.plate),
                fields.color.trim(),
            )
            .await
    }

    pub async fn delete_vehicle<'e, E>(&self, executor: E, owner_id: Uuid, vehicle_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_vehicle(executor, owner_id, vehicle_id).await
    }
}
