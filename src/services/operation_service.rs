// src/services/operation_service.rs

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        operations_repo::DisplayNumberTable, CrmRepository, FinanceRepository, InventoryRepository,
        OperationsRepository, TeamRepository,
    },
    models::operations::{
        LineItem, OsStatus, PaymentMethod, Sale, SaleDraft, SaleStatus, SalesReport,
        ServiceOrder, ServiceOrderDraft, ServiceOrderFilter,
    },
    services::lifecycle::{
        self, enters_finishing, generate_display_number, order_income, order_total, sale_income,
        sale_totals, stock_deductions, NumberRegistry,
    },
};

/// Existência de número de exibição checada dentro da transação corrente.
struct PgNumberRegistry<'a> {
    repo: &'a OperationsRepository,
    conn: &'a mut PgConnection,
    table: DisplayNumberTable,
}

impl NumberRegistry for PgNumberRegistry<'_> {
    async fn exists(&mut self, candidate: &str) -> Result<bool, AppError> {
        self.repo.display_number_exists(&mut *self.conn, self.table, candidate).await
    }
}

/// Dados de uma OS vindos do cliente. O total é sempre recalculado.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub client_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub status: OsStatus,
    pub description: String,
    pub body_lines: Vec<String>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone)]
pub struct SaleInput {
    pub client_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub global_discount: Decimal,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub is_installments: bool,
    pub installments_count: Option<i32>,
}

/// Linha do carrinho do PDV.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct OperationService {
    repo: OperationsRepository,
    crm_repo: CrmRepository,
    inventory_repo: InventoryRepository,
    finance_repo: FinanceRepository,
    team_repo: TeamRepository,
}

impl OperationService {
    pub fn new(
        repo: OperationsRepository,
        crm_repo: CrmRepository,
        inventory_repo: InventoryRepository,
        finance_repo: FinanceRepository,
        team_repo: TeamRepository,
    ) -> Self {
        Self { repo, crm_repo, inventory_repo, finance_repo, team_repo }
    }

    // =========================================================================
    //  ORDENS DE SERVIÇO
    // =========================================================================

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        filter: &ServiceOrderFilter,
    ) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_orders(executor, owner_id, filter).await
    }

    pub async fn get_order<'e, E>(&self, executor: E, owner_id: Uuid, order_id: Uuid) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_order(executor, owner_id, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("OS".into()))
    }

    /// Cria a OS já numerada. Se nascer finalizada, fatura na mesma transação.
    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        input: OrderInput,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.check_order_refs(&mut tx, owner_id, &input).await?;

        let os_number = self.next_number(&mut tx, DisplayNumberTable::ServiceOrders).await?;
        let draft = order_draft(input)?;
        let order = self.repo.insert_order(&mut *tx, owner_id, &os_number, &draft).await?;

        let order = if enters_finishing(None, order.status.is_finishing()) {
            self.bill_order(&mut tx, owner_id, order).await?
        } else {
            order
        };

        tx.commit().await?;
        tracing::info!("OS #{} criada ({:?})", os_number, order.status);
        Ok(order)
    }

    /// Atualização completa (inclusive status).
    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        input: OrderInput,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let previous = self.lock_order(&mut tx, owner_id, order_id).await?;
        self.check_order_refs(&mut tx, owner_id, &input).await?;

        let draft = order_draft(input)?;
        let order = self.repo.update_order(&mut *tx, owner_id, order_id, &draft).await?;

        let order = if enters_finishing(Some(previous.status.is_finishing()), order.status.is_finishing()) {
            self.bill_order(&mut tx, owner_id, order).await?
        } else {
            order
        };

        tx.commit().await?;
        Ok(order)
    }

    pub async fn change_order_status<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        status: OsStatus,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self.transition_order(&mut tx, owner_id, order_id, status).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn delete_order<'e, E>(&self, executor: E, owner_id: Uuid, order_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_order(executor, owner_id, order_id).await
    }

    // =========================================================================
    //  BANCADA DO MECÂNICO
    // =========================================================================

    /// OS abertas da oficina, disponíveis para qualquer mecânico.
    pub async fn list_open_orders<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let filter = ServiceOrderFilter { status: Some(OsStatus::Open), ..Default::default() };
        self.repo.list_orders(executor, owner_id, &filter).await
    }

    pub async fn list_my_orders<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_active_orders_of_mechanic(executor, owner_id, mechanic_id).await
    }

    /// Assume uma OS aberta. Dois mecânicos ao mesmo tempo: só um consegue.
    pub async fn start_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = self
            .repo
            .claim_open_order(executor, owner_id, order_id, mechanic_id)
            .await?
            .ok_or(AppError::OrderNotAvailable)?;

        tracing::info!("OS {} assumida pelo mecânico {}", order.id, mechanic_id);
        Ok(order)
    }

    pub async fn finish_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.lock_order(&mut tx, owner_id, order_id).await?;
        if current.mechanic_id != Some(mechanic_id) {
            return Err(AppError::Forbidden);
        }

        let order = self.transition_order(&mut tx, owner_id, order_id, OsStatus::Finished).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Adiciona um produto do estoque à OS do mecânico.
    pub async fn add_product_to_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.lock_assigned_order(&mut tx, owner_id, order_id, mechanic_id).await?;
        let product = self
            .inventory_repo
            .find_product(&mut *tx, owner_id, product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

        let mut items = order.items.0;
        lifecycle::add_product_item(&mut items, &product, quantity);

        let order = self
            .repo
            .set_order_items(&mut *tx, owner_id, order_id, &items, order_total(&items)?)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn remove_product_from_order<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
        product_id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.lock_assigned_order(&mut tx, owner_id, order_id, mechanic_id).await?;
        let mut items = order.items.0;
        if !lifecycle::remove_product_item(&mut items, product_id) {
            return Err(AppError::ResourceNotFound("Item".into()));
        }

        let order = self
            .repo
            .set_order_items(&mut *tx, owner_id, order_id, &items, order_total(&items)?)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn change_product_quantity<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.lock_assigned_order(&mut tx, owner_id, order_id, mechanic_id).await?;
        let mut items = order.items.0;
        if !lifecycle::change_product_quantity(&mut items, product_id, delta) {
            return Err(AppError::ResourceNotFound("Item".into()));
        }

        let order = self
            .repo
            .set_order_items(&mut *tx, owner_id, order_id, &items, order_total(&items)?)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    pub async fn list_sales<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        status: Option<SaleStatus>,
    ) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_sales(executor, owner_id, status).await
    }

    pub async fn get_sale<'e, E>(&self, executor: E, owner_id: Uuid, sale_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_sale(executor, owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        seller_id: Uuid,
        input: SaleInput,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let sale = self.insert_sale(&mut tx, owner_id, seller_id, input).await?;
        tx.commit().await?;
        Ok(sale)
    }

    /// Venda finalizada não pode mais ser editada.
    pub async fn update_sale<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
        input: SaleInput,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let previous = self.lock_sale(&mut tx, owner_id, sale_id).await?;
        if previous.status == SaleStatus::Finalized {
            return Err(AppError::SaleAlreadyFinalized);
        }
        self.check_sale_client(&mut tx, owner_id, input.client_id).await?;

        let draft = sale_draft(input)?;
        let sale = self.repo.update_sale(&mut *tx, owner_id, sale_id, &draft).await?;

        let sale = if enters_finishing(Some(previous.status.is_finishing()), sale.status.is_finishing()) {
            self.bill_sale(&mut tx, owner_id, sale).await?
        } else {
            sale
        };

        tx.commit().await?;
        Ok(sale)
    }

    pub async fn finalize_sale<'e, E>(&self, executor: E, owner_id: Uuid, sale_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.change_sale_status(executor, owner_id, sale_id, SaleStatus::Finalized).await
    }

    pub async fn cancel_sale<'e, E>(&self, executor: E, owner_id: Uuid, sale_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.change_sale_status(executor, owner_id, sale_id, SaleStatus::Cancelled).await
    }

    pub async fn delete_sale<'e, E>(&self, executor: E, owner_id: Uuid, sale_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_sale(executor, owner_id, sale_id).await
    }

    /// Checkout do PDV: confere o estoque e grava uma venda FINALIZED.
    pub async fn checkout<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        seller_id: Uuid,
        client_id: Option<Uuid>,
        cart: &[CartLine],
        payment_method: PaymentMethod,
        installments_count: Option<i32>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut items: Vec<LineItem> = Vec::with_capacity(cart.len());
        for line in cart {
            let product = self
                .inventory_repo
                .find_product(&mut *tx, owner_id, line.product_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

            let already_in_cart = items
                .iter()
                .filter(|i| i.product_id == Some(product.id))
                .fold(0i32, |acc, i| acc.saturating_add(i.quantity));
            if already_in_cart.saturating_add(line.quantity) > product.stock {
                return Err(AppError::InsufficientStock(product.name));
            }

            lifecycle::add_product_item(&mut items, &product, line.quantity);
        }

        let is_installments = payment_method == PaymentMethod::Installments;
        let input = SaleInput {
            client_id,
            items,
            global_discount: Decimal::ZERO,
            status: SaleStatus::Finalized,
            payment_method,
            is_installments,
            installments_count: if is_installments { installments_count } else { None },
        };

        let sale = self.insert_sale(&mut tx, owner_id, seller_id, input).await?;
        tx.commit().await?;
        Ok(sale)
    }

    /// Relatório do período [from, to).
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
        self.repo.sales_report(executor, owner_id, from, to).await
    }

    // =========================================================================
    //  INTERNOS (sempre dentro de uma transação aberta)
    // =========================================================================

    async fn lock_order(&self, conn: &mut PgConnection, owner_id: Uuid, order_id: Uuid) -> Result<ServiceOrder, AppError> {
        self.repo
            .lock_order(&mut *conn, owner_id, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("OS".into()))
    }

    async fn lock_sale(&self, conn: &mut PgConnection, owner_id: Uuid, sale_id: Uuid) -> Result<Sale, AppError> {
        self.repo
            .lock_sale(&mut *conn, owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    async fn lock_assigned_order(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        order_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<ServiceOrder, AppError> {
        let order = self.lock_order(conn, owner_id, order_id).await?;
        if order.mechanic_id != Some(mechanic_id) {
            return Err(AppError::Forbidden);
        }
        Ok(order)
    }

    async fn next_number(&self, conn: &mut PgConnection, table: DisplayNumberTable) -> Result<String, AppError> {
        let mut rng = StdRng::from_entropy();
        let mut registry = PgNumberRegistry { repo: &self.repo, conn, table };
        generate_display_number(&mut rng, &mut registry).await
    }

    async fn check_order_refs(&self, conn: &mut PgConnection, owner_id: Uuid, input: &OrderInput) -> Result<(), AppError> {
        if self.crm_repo.find_client(&mut *conn, owner_id, input.client_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }

        let vehicle = self
            .crm_repo
            .find_vehicle(&mut *conn, owner_id, input.vehicle_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Veículo".into()))?;
        if vehicle.client_id != input.client_id {
            return Err(AppError::ResourceNotFound("Veículo".into()));
        }

        if let Some(mechanic_id) = input.mechanic_id {
            if self.team_repo.find_mechanic(&mut *conn, owner_id, mechanic_id).await?.is_none() {
                return Err(AppError::ResourceNotFound("Mecânico".into()));
            }
        }
        Ok(())
    }

    async fn check_sale_client(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        client_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(client_id) = client_id {
            if self.crm_repo.find_client(&mut *conn, owner_id, client_id).await?.is_none() {
                return Err(AppError::ResourceNotFound("Cliente".into()));
            }
        }
        Ok(())
    }

    /// Troca o status sob lock e fatura se estiver entrando em estado final.
    async fn transition_order(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        order_id: Uuid,
        status: OsStatus,
    ) -> Result<ServiceOrder, AppError> {
        let previous = self.lock_order(conn, owner_id, order_id).await?;
        let order = self.repo.set_order_status(&mut *conn, owner_id, order_id, status).await?;

        if enters_finishing(Some(previous.status.is_finishing()), status.is_finishing()) {
            return self.bill_order(conn, owner_id, order).await;
        }
        Ok(order)
    }

    async fn change_sale_status<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let previous = self.lock_sale(&mut tx, owner_id, sale_id).await?;
        let sale = self.repo.set_sale_status(&mut *tx, owner_id, sale_id, status).await?;

        let sale = if enters_finishing(Some(previous.status.is_finishing()), status.is_finishing()) {
            self.bill_sale(&mut tx, owner_id, sale).await?
        } else {
            sale
        };

        tx.commit().await?;
        Ok(sale)
    }

    async fn insert_sale(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        seller_id: Uuid,
        input: SaleInput,
    ) -> Result<Sale, AppError> {
        self.check_sale_client(conn, owner_id, input.client_id).await?;

        let draft = sale_draft(input)?;
        let sale = self.repo.insert_sale(&mut *conn, owner_id, seller_id, &draft).await?;

        if enters_finishing(None, sale.status.is_finishing()) {
            return self.bill_sale(conn, owner_id, sale).await;
        }
        Ok(sale)
    }

    /// Faturamento da OS: número, receita e baixa de estoque.
    async fn bill_order(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        mut order: ServiceOrder,
    ) -> Result<ServiceOrder, AppError> {
        let os_number = match order.os_number.clone() {
            Some(number) => number,
            None => {
                let number = self.next_number(conn, DisplayNumberTable::ServiceOrders).await?;
                self.repo.set_order_number(&mut *conn, owner_id, order.id, &number).await?;
                order.os_number = Some(number.clone());
                number
            }
        };

        let client_name = self
            .crm_repo
            .find_client(&mut *conn, owner_id, order.client_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();

        let entry = order_income(order.id, &os_number, &client_name, order.total, Utc::now());
        self.finance_repo.insert_transaction(&mut *conn, owner_id, &entry).await?;

        self.deduct_stock(conn, owner_id, &order.items.0).await?;

        tracing::info!("OS #{} faturada: {}", os_number, order.total);
        Ok(order)
    }

    async fn bill_sale(&self, conn: &mut PgConnection, owner_id: Uuid, mut sale: Sale) -> Result<Sale, AppError> {
        let sale_number = match sale.sale_number.clone() {
            Some(number) => number,
            None => {
                let number = self.next_number(conn, DisplayNumberTable::Sales).await?;
                self.repo.set_sale_number(&mut *conn, owner_id, sale.id, &number).await?;
                sale.sale_number = Some(number.clone());
                number
            }
        };

        let client_name = match sale.client_id {
            Some(client_id) => self
                .crm_repo
                .find_client(&mut *conn, owner_id, client_id)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let entry = sale_income(
            sale.id,
            &sale_number,
            client_name.as_deref(),
            sale.total,
            sale.payment_method,
            sale.is_installments,
            Utc::now(),
        );
        self.finance_repo.insert_transaction(&mut *conn, owner_id, &entry).await?;

        self.deduct_stock(conn, owner_id, &sale.items.0).await?;

        tracing::info!("Venda #{} faturada: {}", sale_number, sale.total);
        Ok(sale)
    }

    /// Estoque negativo desfaz a transação inteira.
    async fn deduct_stock(&self, conn: &mut PgConnection, owner_id: Uuid, items: &[LineItem]) -> Result<(), AppError> {
        for deduction in stock_deductions(items) {
            match self
                .inventory_repo
                .apply_stock_delta(&mut *conn, owner_id, deduction.product_id, -deduction.quantity)
                .await?
            {
                Some((name, stock)) if stock < 0 => return Err(AppError::InsufficientStock(name)),
                Some((name, stock)) => {
                    tracing::debug!("Baixa de {} un. em '{}' (restam {})", deduction.quantity, name, stock)
                }
                None => tracing::warn!("Produto {} não existe mais; baixa ignorada", deduction.product_id),
            }
        }
        Ok(())
    }
}

fn order_draft(input: OrderInput) -> Result<ServiceOrderDraft, AppError> {
    let total = order_total(&input.items)?;
    Ok(ServiceOrderDraft {
        client_id: input.client_id,
        vehicle_id: input.vehicle_id,
        mechanic_id: input.mechanic_id,
        status: input.status,
        description: input.description,
        body_lines: input.body_lines,
        items: input.items,
        total,
    })
}

fn sale_draft(input: SaleInput) -> Result<SaleDraft, AppError> {
    let totals = sale_totals(&input.items, input.global_discount)?;
    Ok(SaleDraft {
        client_id: input.client_id,
        items: input.items,
        subtotal: totals.subtotal,
        total_discount: totals.total_discount,
        total: totals.total,
        status: input.status,
        payment_method: input.payment_method,
        is_installments: input.is_installments,
        installments_count: input.installments_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operations::ItemKind;

    fn item(kind: ItemKind, quantity: i32, price: &str, discount: &str) -> LineItem {
        LineItem {
            product_id: None,
            service_id: None,
            name: "Item".into(),
            quantity,
            price: price.parse().unwrap(),
            discount: discount.parse().unwrap(),
            kind,
        }
    }

    #[test]
    fn order_draft_recomputes_total() {
        let input = OrderInput {
            client_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            mechanic_id: None,
            status: OsStatus::Open,
            description: "Troca de óleo".into(),
            body_lines: vec![],
            items: vec![item(ItemKind::Product, 3, "10.50", "0"), item(ItemKind::Service, 1, "80", "0")],
        };

        let draft = order_draft(input).unwrap();
        assert_eq!(draft.total, "111.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn sale_draft_applies_item_and_global_discount() {
        let input = SaleInput {
            client_id: None,
            items: vec![item(ItemKind::Product, 2, "50", "5")],
            global_discount: "10".parse().unwrap(),
            status: SaleStatus::Quote,
            payment_method: PaymentMethod::Pix,
            is_installments: false,
            installments_count: None,
        };

        let draft = sale_draft(input).unwrap();
        assert_eq!(draft.subtotal, Decimal::from(100));
        assert_eq!(draft.total_discount, Decimal::from(20));
        assert_eq!(draft.total, Decimal::from(80));
    }

    #[test]
    fn sale_draft_refuses_negative_total() {
        let input = SaleInput {
            client_id: None,
            items: vec![item(ItemKind::Product, 1, "10", "30")],
            global_discount: "50".parse().unwrap(),
            status: SaleStatus::Finalized,
            payment_method: PaymentMethod::Cash,
            is_installments: false,
            installments_count: None,
        };

        assert!(matches!(sale_draft(input), Err(AppError::DiscountExceedsTotal)));
    }

    #[test]
    fn order_draft_refuses_overflowing_items() {
        let input = OrderInput {
            client_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            mechanic_id: None,
            status: OsStatus::Open,
            description: String::new(),
            body_lines: vec![],
            items: vec![item(ItemKind::Product, 2, "50000000000000000000000000000", "0")],
        };

        assert!(matches!(order_draft(input), Err(AppError::AmountOutOfRange)));
    }
}
