// src/services/portal_service.rs
//
// Portal público do cliente: consulta da OS sem login e aprovação do orçamento.

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OperationsRepository, PortalRepository},
    models::{
        crm::{digits_only, normalize_plate},
        portal::{PortalDecision, PortalOrder},
    },
};

#[derive(Clone)]
pub struct PortalService {
    repo: PortalRepository,
    operations_repo: OperationsRepository,
}

impl PortalService {
    pub fn new(repo: PortalRepository, operations_repo: OperationsRepository) -> Self {
        Self { repo, operations_repo }
    }

    /// Placa + documento (CPF/CNPJ ou telefone). Os dois precisam estar preenchidos.
    pub async fn find_by_vehicle<'e, E>(
        &self,
        executor: E,
        plate: &str,
        document: &str,
        workshop_id: Option<Uuid>,
    ) -> Result<Vec<PortalOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plate = normalize_plate(plate);
        let digits = digits_only(document);
        if plate.is_empty() || digits.is_empty() {
            return Ok(Vec::new());
        }

        self.repo.find_by_plate_and_document(executor, &plate, &digits, workshop_id).await
    }

    pub async fn find_by_number<'e, E>(
        &self,
        executor: E,
        number: &str,
        workshop_id: Option<Uuid>,
    ) -> Result<Vec<PortalOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let number = number.trim().trim_start_matches('#');
        if number.is_empty() {
            return Ok(Vec::new());
        }

        self.repo.find_by_number(executor, number, workshop_id).await
    }

    /// Aprova ou recusa o orçamento. Só vale enquanto a OS estiver OPEN.
    pub async fn decide<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        decision: PortalDecision,
    ) -> Result<PortalOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let decided = self
            .operations_repo
            .decide_open_order(&mut *conn, order_id, decision.status(), decision.note())
            .await?;

        let order = self
            .repo
            .find_by_id(&mut *conn, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("OS".into()))?;

        if decided.is_none() {
            return Err(AppError::OrderNotOpen);
        }

        tracing::info!("OS {} {:?} pelo cliente no portal", order_id, decision);
        Ok(order)
    }
}
