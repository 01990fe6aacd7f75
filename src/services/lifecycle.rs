// src/services/lifecycle.rs
//
// Regras puras do ciclo de vida de OS e vendas: quando faturar, quanto
// faturar, quanto baixar do estoque e como gerar o número de exibição.
// Nada aqui toca o banco; o OperationService aplica o plano numa transação.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        finance::{NewTransaction, TransactionCategory, TransactionStatus},
        inventory::Product,
        operations::{max_amount, ItemKind, LineItem, PaymentMethod, MAX_QUANTITY},
    },
};

pub const DISPLAY_NUMBER_MIN: u32 = 100_000;
pub const DISPLAY_NUMBER_MAX: u32 = 999_999;
pub const MAX_DISPLAY_NUMBER_ATTEMPTS: usize = 50;

const WALK_IN_CUSTOMER: &str = "Consumidor";

/// O documento está entrando num estado de faturamento agora?
/// `previous_finishing` é `None` na criação.
pub fn enters_finishing(previous_finishing: Option<bool>, next_finishing: bool) -> bool {
    next_finishing && !previous_finishing.unwrap_or(false)
}

// =============================================================================
//  TOTAIS
// =============================================================================

/// Σ quantidade × valor, recusando o que não cabe numa coluna NUMERIC(12, 2).
fn checked_sum(items: &[LineItem], value: impl Fn(&LineItem) -> Decimal) -> Result<Decimal, AppError> {
    let sum = items.iter().try_fold(Decimal::ZERO, |acc, i| {
        Decimal::from(i.quantity)
            .checked_mul(value(i))
            .and_then(|line| acc.checked_add(line))
    });

    match sum {
        Some(sum) if sum <= max_amount() => Ok(sum),
        _ => Err(AppError::AmountOutOfRange),
    }
}

/// Total de uma OS: Σ quantidade × preço.
pub fn order_total(items: &[LineItem]) -> Result<Decimal, AppError> {
    checked_sum(items, |i| i.price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    // desconto dos itens + desconto global
    pub total_discount: Decimal,
    pub total: Decimal,
}

/// subtotal = Σ preço × qtd; desconto = Σ desconto × qtd + global; total = subtotal − desconto.
/// Desconto unitário acima do preço, ou total negativo, é recusado.
pub fn sale_totals(items: &[LineItem], global_discount: Decimal) -> Result<SaleTotals, AppError> {
    if items.iter().any(|i| i.discount > i.price) || global_discount.is_sign_negative() {
        return Err(AppError::DiscountExceedsTotal);
    }

    let subtotal = order_total(items)?;
    let items_discount = checked_sum(items, |i| i.discount)?;
    let total_discount = items_discount
        .checked_add(global_discount)
        .ok_or(AppError::AmountOutOfRange)?;

    if total_discount > subtotal {
        return Err(AppError::DiscountExceedsTotal);
    }

    Ok(SaleTotals { subtotal, total_discount, total: subtotal - total_discount })
}

// =============================================================================
//  PLANO DE FATURAMENTO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDeduction {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Baixas de estoque dos itens PRODUCT com produto vinculado.
/// Agrupadas por produto e ordenadas por id (ordem fixa de lock entre transações).
pub fn stock_deductions(items: &[LineItem]) -> Vec<StockDeduction> {
    let mut per_product: BTreeMap<Uuid, i32> = BTreeMap::new();

    for item in items {
        if item.kind != ItemKind::Product {
            continue;
        }
        if let Some(product_id) = item.product_id {
            let total = per_product.entry(product_id).or_insert(0);
            *total = total.saturating_add(item.quantity);
        }
    }

    per_product
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0)
        .map(|(product_id, quantity)| StockDeduction { product_id, quantity })
        .collect()
}

/// Receita de uma OS finalizada: sempre paga, em dinheiro.
pub fn order_income(
    order_id: Uuid,
    os_number: &str,
    client_name: &str,
    total: Decimal,
    date: DateTime<Utc>,
) -> NewTransaction {
    NewTransaction {
        label: format!("OS #{} - {}", os_number, client_name),
        category: TransactionCategory::Income,
        amount: total,
        status: TransactionStatus::Paid,
        payment_method: Some(PaymentMethod::Cash.as_str().to_string()),
        service_order_id: Some(order_id),
        sale_id: None,
        date,
    }
}

/// Receita de uma venda finalizada: pendente quando parcelada.
pub fn sale_income(
    sale_id: Uuid,
    sale_number: &str,
    client_name: Option<&str>,
    total: Decimal,
    payment_method: PaymentMethod,
    is_installments: bool,
    date: DateTime<Utc>,
) -> NewTransaction {
    let status = if is_installments { TransactionStatus::Pending } else { TransactionStatus::Paid };

    NewTransaction {
        label: format!("Venda #{} - {}", sale_number, client_name.unwrap_or(WALK_IN_CUSTOMER)),
        category: TransactionCategory::Income,
        amount: total,
        status,
        payment_method: Some(payment_method.as_str().to_string()),
        service_order_id: None,
        sale_id: Some(sale_id),
        date,
    }
}

// =============================================================================
//  EDIÇÃO DE ITENS (bancada do mecânico)
// =============================================================================

/// Adiciona o produto à lista; se já estiver lá, soma a quantidade (até `MAX_QUANTITY`).
pub fn add_product_item(items: &mut Vec<LineItem>, product: &Product, quantity: i32) {
    let quantity = quantity.clamp(1, MAX_QUANTITY);

    if let Some(existing) = items
        .iter_mut()
        .find(|i| i.kind == ItemKind::Product && i.product_id == Some(product.id))
    {
        existing.quantity = existing.quantity.saturating_add(quantity).min(MAX_QUANTITY);
        return;
    }

    items.push(LineItem {
        product_id: Some(product.id),
        service_id: None,
        name: product.name.clone(),
        quantity,
        price: product.price,
        discount: Decimal::ZERO,
        kind: ItemKind::Product,
    });
}

/// Remove o produto da lista. Devolve `false` se ele não estava lá.
pub fn remove_product_item(items: &mut Vec<LineItem>, product_id: Uuid) -> bool {
    let before = items.len();
    items.retain(|i| !(i.kind == ItemKind::Product && i.product_id == Some(product_id)));
    items.len() != before
}

/// Soma `delta` à quantidade do produto, entre 1 e `MAX_QUANTITY`.
pub fn change_product_quantity(items: &mut [LineItem], product_id: Uuid, delta: i32) -> bool {
    match items
        .iter_mut()
        .find(|i| i.kind == ItemKind::Product && i.product_id == Some(product_id))
    {
        Some(item) => {
            item.quantity = item.quantity.saturating_add(delta).clamp(1, MAX_QUANTITY);
            true
        }
        None => false,
    }
}

// =============================================================================
//  NÚMERO DE EXIBIÇÃO
// =============================================================================

/// Onde checar se um número já foi usado.
#[allow(async_fn_in_trait)]
pub trait NumberRegistry {
    async fn exists(&mut self, candidate: &str) -> Result<bool, AppError>;
}

/// Sorteia um número de 6 dígitos que ainda não exista no registro.
/// Desiste após `MAX_DISPLAY_NUMBER_ATTEMPTS` colisões seguidas.
pub async fn generate_display_number<R, N>(rng: &mut R, registry: &mut N) -> Result<String, AppError>
where
    R: Rng,
    N: NumberRegistry,
{
    for _ in 0..MAX_DISPLAY_NUMBER_ATTEMPTS {
        let candidate = rng.gen_range(DISPLAY_NUMBER_MIN..=DISPLAY_NUMBER_MAX).to_string();
        if !registry.exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    tracing::error!("Sem número de exibição livre após {} tentativas", MAX_DISPLAY_NUMBER_ATTEMPTS);
    Err(AppError::DisplayNumberExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    // Registro em memória
    struct InMemoryRegistry {
        taken: HashSet<String>,
        lookups: usize,
    }

    impl NumberRegistry for InMemoryRegistry {
        async fn exists(&mut self, candidate: &str) -> Result<bool, AppError> {
            self.lookups += 1;
            Ok(self.taken.contains(candidate))
        }
    }

    struct AlwaysTaken;

    impl NumberRegistry for AlwaysTaken {
        async fn exists(&mut self, _candidate: &str) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    fn product_item(product_id: Option<Uuid>, quantity: i32, price: Decimal) -> LineItem {
        LineItem {
            product_id,
            service_id: None,
            name: "Óleo".into(),
            quantity,
            price,
            discount: Decimal::ZERO,
            kind: ItemKind::Product,
        }
    }

    fn service_item(quantity: i32, price: Decimal) -> LineItem {
        LineItem {
            product_id: None,
            service_id: Some(Uuid::new_v4()),
            name: "Mão de obra".into(),
            quantity,
            price,
            discount: Decimal::ZERO,
            kind: ItemKind::Service,
        }
    }

    #[test]
    fn only_first_entry_into_finishing_bills() {
        assert!(enters_finishing(None, true));
        assert!(enters_finishing(Some(false), true));
        assert!(!enters_finishing(Some(true), true));
        assert!(!enters_finishing(Some(false), false));
        assert!(!enters_finishing(None, false));
    }

    #[test]
    fn order_total_is_quantity_times_price() {
        let items = vec![product_item(Some(Uuid::new_v4()), 3, dec("25.50")), service_item(1, dec("80"))];
        assert_eq!(order_total(&items).unwrap(), dec("156.50"));
        assert_eq!(order_total(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn order_total_rejects_values_that_overflow() {
        let items = vec![product_item(None, 2, dec("50000000000000000000000000000"))];
        assert!(matches!(order_total(&items), Err(AppError::AmountOutOfRange)));

        // Cabe no Decimal, mas não na coluna
        let items = vec![product_item(None, 2, dec("9999999999.99"))];
        assert!(matches!(order_total(&items), Err(AppError::AmountOutOfRange)));
    }

    #[test]
    fn sale_totals_apply_item_and_global_discounts() {
        let mut item = product_item(Some(Uuid::new_v4()), 2, dec("100"));
        item.discount = dec("5");
        let totals = sale_totals(&[item], dec("10")).unwrap();

        assert_eq!(totals.subtotal, dec("200"));
        assert_eq!(totals.total_discount, dec("20"));
        assert_eq!(totals.total, dec("180"));
    }

    #[test]
    fn sale_discounts_cannot_exceed_the_items() {
        let mut item = product_item(None, 1, dec("10"));
        item.discount = dec("30");
        assert!(matches!(sale_totals(&[item], dec("50")), Err(AppError::DiscountExceedsTotal)));

        let mut item = product_item(None, 2, dec("10"));
        item.discount = dec("4");
        assert!(matches!(sale_totals(&[item.clone()], dec("12.01")), Err(AppError::DiscountExceedsTotal)));

        // Desconto igual ao subtotal zera a venda
        let totals = sale_totals(&[item], dec("12")).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn only_linked_products_reduce_stock() {
        let oil = Uuid::new_v4();
        let items = vec![
            product_item(Some(oil), 3, dec("10")),
            product_item(None, 5, dec("10")), // item avulso
            service_item(2, dec("50")),
        ];

        assert_eq!(stock_deductions(&items), vec![StockDeduction { product_id: oil, quantity: 3 }]);
    }

    #[test]
    fn deductions_are_aggregated_and_sorted_by_product() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let items = vec![
            product_item(Some(ids[1]), 1, dec("1")),
            product_item(Some(ids[0]), 2, dec("1")),
            product_item(Some(ids[1]), 4, dec("1")),
        ];

        let deductions = stock_deductions(&items);
        assert_eq!(
            deductions,
            vec![
                StockDeduction { product_id: ids[0], quantity: 2 },
                StockDeduction { product_id: ids[1], quantity: 5 },
            ]
        );
    }

    #[test]
    fn order_income_is_paid_cash_with_label() {
        let id = Uuid::new_v4();
        let entry = order_income(id, "482913", "João", dec("211.80"), Utc::now());

        assert_eq!(entry.label, "OS #482913 - João");
        assert_eq!(entry.category, TransactionCategory::Income);
        assert_eq!(entry.status, TransactionStatus::Paid);
        assert_eq!(entry.payment_method.as_deref(), Some("CASH"));
        assert_eq!(entry.amount, dec("211.80"));
        assert_eq!(entry.service_order_id, Some(id));
        assert_eq!(entry.sale_id, None);
    }

    #[test]
    fn installment_sale_income_is_pending() {
        let id = Uuid::new_v4();
        let entry = sale_income(id, "731204", None, dec("300"), PaymentMethod::CreditCard, true, Utc::now());

        assert_eq!(entry.label, "Venda #731204 - Consumidor");
        assert_eq!(entry.status, TransactionStatus::Pending);
        assert_eq!(entry.payment_method.as_deref(), Some("CREDIT_CARD"));
        assert_eq!(entry.sale_id, Some(id));

        let paid = sale_income(id, "731204", Some("Maria"), dec("300"), PaymentMethod::Pix, false, Utc::now());
        assert_eq!(paid.label, "Venda #731204 - Maria");
        assert_eq!(paid.status, TransactionStatus::Paid);
    }

    fn product(price: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Pastilha".into(),
            sku: "PAS-01".into(),
            price,
            cost_price: Decimal::ZERO,
            stock: 10,
            min_stock: 2,
            ncm: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let p = product(dec("40"));
        let mut items = Vec::new();
        add_product_item(&mut items, &p, 1);
        add_product_item(&mut items, &p, 2);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(order_total(&items).unwrap(), dec("120"));
    }

    #[test]
    fn quantity_never_drops_below_one() {
        let p = product(dec("40"));
        let mut items = Vec::new();
        add_product_item(&mut items, &p, 2);

        assert!(change_product_quantity(&mut items, p.id, -5));
        assert_eq!(items[0].quantity, 1);
        assert!(!change_product_quantity(&mut items, Uuid::new_v4(), 1));
    }

    #[test]
    fn huge_quantity_changes_saturate() {
        let p = product(dec("40"));
        let mut items = Vec::new();
        add_product_item(&mut items, &p, 2);

        assert!(change_product_quantity(&mut items, p.id, i32::MAX));
        assert_eq!(items[0].quantity, MAX_QUANTITY);
        add_product_item(&mut items, &p, i32::MAX);
        assert_eq!(items[0].quantity, MAX_QUANTITY);
        assert!(change_product_quantity(&mut items, p.id, i32::MIN));
        assert_eq!(items[0].quantity, 1);

        let oil = Uuid::new_v4();
        let deductions = stock_deductions(&[product_item(Some(oil), i32::MAX, dec("1")), product_item(Some(oil), 5, dec("1"))]);
        assert_eq!(deductions, vec![StockDeduction { product_id: oil, quantity: i32::MAX }]);
    }

    #[test]
    fn removing_product_keeps_other_items() {
        let p = product(dec("40"));
        let mut items = vec![service_item(1, dec("80"))];
        add_product_item(&mut items, &p, 1);

        assert!(remove_product_item(&mut items, p.id));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Service);
        assert!(!remove_product_item(&mut items, p.id));
    }

    #[tokio::test]
    async fn display_number_is_six_digits_and_unused() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = InMemoryRegistry { taken: HashSet::new(), lookups: 0 };

        let number = generate_display_number(&mut rng, &mut registry).await.unwrap();
        let value: u32 = number.parse().unwrap();
        assert_eq!(number.len(), 6);
        assert!((DISPLAY_NUMBER_MIN..=DISPLAY_NUMBER_MAX).contains(&value));
        assert_eq!(registry.lookups, 1);
    }

    #[tokio::test]
    async fn display_number_rerolls_on_collision() {
        // Descobre o primeiro sorteio da semente e marca como usado
        let first = StdRng::seed_from_u64(42)
            .gen_range(DISPLAY_NUMBER_MIN..=DISPLAY_NUMBER_MAX)
            .to_string();
        let mut registry = InMemoryRegistry { taken: HashSet::from([first.clone()]), lookups: 0 };

        let mut rng = StdRng::seed_from_u64(42);
        let number = generate_display_number(&mut rng, &mut registry).await.unwrap();

        assert_ne!(number, first);
        assert_eq!(registry.lookups, 2);
    }

    #[tokio::test]
    async fn display_number_gives_up_after_bounded_attempts() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = generate_display_number(&mut rng, &mut AlwaysTaken).await;
        assert!(matches!(result, Err(AppError::DisplayNumberExhausted)));
    }
}
