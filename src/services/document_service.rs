// src/services/document_service.rs

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, OperationsRepository, SettingsRepository},
    models::{operations::LineItem, settings::WorkshopSettings},
};

const FONT_FAMILY: &str = "Roboto";
const DEFAULT_TITLE: &str = "OFICINA";

/// Linha impressa: total = quantidade × (preço − desconto).
#[derive(Debug, Clone, PartialEq)]
struct PrintLine {
    name: String,
    quantity: i32,
    price: Decimal,
    total: Decimal,
}

/// Conteúdo de um documento impresso (OS ou venda).
#[derive(Debug, Clone)]
struct Printable {
    heading: String,
    date: DateTime<Utc>,
    client_name: String,
    vehicle: Option<String>,
    description: Option<String>,
    lines: Vec<PrintLine>,
    discount: Decimal,
    total: Decimal,
}

fn print_lines(items: &[LineItem]) -> Vec<PrintLine> {
    items
        .iter()
        .map(|i| PrintLine {
            name: i.name.clone(),
            quantity: i.quantity,
            price: i.price,
            total: Decimal::from(i.quantity) * (i.price - i.discount),
        })
        .collect()
}

fn money(value: Decimal) -> String {
    format!("R$ {:.2}", value.round_dp(2))
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao montar o PDF: {}", e))
}

#[derive(Clone)]
pub struct DocumentService {
    repo: OperationsRepository,
    settings_repo: SettingsRepository,
    crm_repo: CrmRepository,
    fonts_dir: String,
}

impl DocumentService {
    pub fn new(
        repo: OperationsRepository,
        settings_repo: SettingsRepository,
        crm_repo: CrmRepository,
        fonts_dir: String,
    ) -> Self {
        Self { repo, settings_repo, crm_repo, fonts_dir }
    }

    /// PDF da OS. Cada impressão incrementa o contador da OS.
    pub async fn generate_order_pdf<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .repo
            .find_order(&mut *tx, owner_id, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("OS".into()))?;
        let settings = self.settings_repo.get_settings(&mut *tx, owner_id).await?;
        let client = self.crm_repo.find_client(&mut *tx, owner_id, order.client_id).await?;
        let vehicle = self.crm_repo.find_vehicle(&mut *tx, owner_id, order.vehicle_id).await?;

        let printable = Printable {
            heading: format!("ORDEM DE SERVIÇO #{}", order.os_number.as_deref().unwrap_or("-")),
            date: order.created_at,
            client_name: client.map(|c| c.name).unwrap_or_default(),
            vehicle: vehicle.map(|v| format!("{} {} ({}) - {}", v.brand, v.model, v.year, v.plate)),
            description: Some(order.description.clone()).filter(|d| !d.trim().is_empty()),
            lines: print_lines(&order.items.0),
            discount: Decimal::ZERO,
            total: order.total,
        };

        let pdf = self.render(&printable, &settings)?;

        self.repo.register_order_print(&mut *tx, owner_id, order_id).await?;
        tx.commit().await?;

        Ok(pdf)
    }

    pub async fn generate_sale_pdf<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self
            .repo
            .find_sale(&mut *tx, owner_id, sale_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))?;
        let settings = self.settings_repo.get_settings(&mut *tx, owner_id).await?;
        let client_name = match sale.client_id {
            Some(client_id) => self.crm_repo.find_client(&mut *tx, owner_id, client_id).await?.map(|c| c.name),
            None => None,
        };

        let printable = Printable {
            heading: format!("VENDA #{}", sale.sale_number.as_deref().unwrap_or("-")),
            date: sale.created_at,
            client_name: client_name.unwrap_or_else(|| "Consumidor Final".to_string()),
            vehicle: None,
            description: None,
            lines: print_lines(&sale.items.0),
            discount: sale.total_discount,
            total: sale.total,
        };

        let pdf = self.render(&printable, &settings)?;

        self.repo.register_sale_print(&mut *tx, owner_id, sale_id).await?;
        tx.commit().await?;

        Ok(pdf)
    }

    fn render(&self, printable: &Printable, settings: &WorkshopSettings) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(format!("{}/{}-*.ttf", self.fonts_dir, FONT_FAMILY)))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(printable.heading.clone());
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        let title = settings.business_name.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
        doc.push(elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(18)));

        if let Some(tax_id) = &settings.tax_id {
            doc.push(
                elements::Paragraph::new(format!("CNPJ/CPF: {}", tax_id))
                    .styled(style::Style::new().with_font_size(10)),
            );
        }
        if let Some(phone) = &settings.phone {
            doc.push(elements::Paragraph::new(format!("Tel: {}", phone)).styled(style::Style::new().with_font_size(10)));
        }

        doc.push(elements::Break::new(1.5));

        doc.push(
            elements::Paragraph::new(printable.heading.clone()).styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!("Data: {}", printable.date.format("%d/%m/%Y"))));
        doc.push(elements::Paragraph::new(format!("Cliente: {}", printable.client_name)));
        if let Some(vehicle) = &printable.vehicle {
            doc.push(elements::Paragraph::new(format!("Veículo: {}", vehicle)));
        }
        if let Some(description) = &printable.description {
            doc.push(elements::Paragraph::new(format!("Relato: {}", description)));
        }

        doc.push(elements::Break::new(2));

        // --- ITENS ---
        // Pesos: Descrição (4), Qtd (1), Unitário (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Descrição").styled(bold))
            .element(elements::Paragraph::new("Qtd").styled(bold))
            .element(elements::Paragraph::new("Unitário").styled(bold))
            .element(elements::Paragraph::new("Total").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for line in &printable.lines {
            table
                .row()
                .element(elements::Paragraph::new(line.name.clone()))
                .element(elements::Paragraph::new(line.quantity.to_string()))
                .element(elements::Paragraph::new(money(line.price)))
                .element(elements::Paragraph::new(money(line.total)))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        // --- TOTAIS ---
        if !printable.discount.is_zero() {
            let mut discount = elements::Paragraph::new(format!("Desconto: {}", money(printable.discount)));
            discount.set_alignment(genpdf::Alignment::Right);
            doc.push(discount);
        }

        let mut total = elements::Paragraph::new(format!("TOTAL: {}", money(printable.total)));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

        doc.push(elements::Break::new(2));

        // --- PIX ---
        if let Some(key) = settings.pix_key.as_deref().filter(|k| !k.trim().is_empty()) {
            doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX").styled(style::Style::new().bold().with_font_size(12)));
            doc.push(elements::Paragraph::new(format!("Chave: {}", key)));
            doc.push(elements::Break::new(1));

            // QR com o texto da chave (não é o BR Code "copia e cola")
            let code = QrCode::new(key.as_bytes()).map_err(pdf_error)?;
            let image_buffer = code.render::<Luma<u8>>().build();
            let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

            let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
                .map_err(pdf_error)?
                .with_scale(genpdf::Scale::new(0.5, 0.5));
            doc.push(pdf_image);
        }

        // --- RODAPÉ ---
        if let Some(address) = &settings.address {
            doc.push(elements::Break::new(2));
            doc.push(elements::Paragraph::new(address.clone()).styled(style::Style::new().italic().with_font_size(8)));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operations::ItemKind;

    #[test]
    fn line_total_applies_unit_discount() {
        let items = vec![LineItem {
            product_id: None,
            service_id: None,
            name: "Pastilha de freio".into(),
            quantity: 2,
            price: Decimal::new(5000, 2),
            discount: Decimal::new(500, 2),
            kind: ItemKind::Product,
        }];

        let lines = print_lines(&items);
        assert_eq!(lines[0].total, Decimal::new(9000, 2));
    }

    #[test]
    fn money_uses_two_decimal_places() {
        assert_eq!(money(Decimal::new(2118, 1)), "R$ 211.80");
        assert_eq!(money(Decimal::from(7)), "R$ 7.00");
    }

    #[tokio::test]
    async fn missing_fonts_is_reported() {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/none").unwrap();
        let service = DocumentService {
            repo: OperationsRepository::new(pool.clone()),
            settings_repo: SettingsRepository::new(pool.clone()),
            crm_repo: CrmRepository::new(pool),
            fonts_dir: "./diretorio-que-nao-existe".into(),
        };
        let printable = Printable {
            heading: "VENDA #1".into(),
            date: Utc::now(),
            client_name: "Consumidor Final".into(),
            vehicle: None,
            description: None,
            lines: vec![],
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
        };

        let err = service.render(&printable, &WorkshopSettings::defaults(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
