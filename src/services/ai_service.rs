// src/services/ai_service.rs
//
// Cliente do Gemini (generateContent via REST). Sem retry e sem streaming.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    models::{
        ai::NcmSuggestion,
        finance::{FinancialSummary, FinancialTransaction},
    },
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// --- Formato da API ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

// --- Prompts ---

fn language_name(lang: &str) -> &'static str {
    if lang == "pt" { "Portuguese (Brazil)" } else { "English" }
}

fn diagnosis_prompt(issue: &str, vehicle_model: &str, lang: &str) -> String {
    format!(
        "Você é um mestre mecânico de motocicletas de alta performance.\n\
         Analise o seguinte problema: \"{issue}\" na moto \"{vehicle_model}\".\n\n\
         Forneça:\n\
         1. Diagnóstico provável (causa raiz).\n\
         2. Peças que devem ser inspecionadas ou substituídas.\n\
         3. Nível de urgência (Baixo, Médio, Alto).\n\n\
         Responda SEMPRE em {} usando formatação MARKDOWN com títulos, negritos e listas. \
         Seja direto e técnico.",
        language_name(lang)
    )
}

fn financial_report_prompt(summary: &FinancialSummary, recent: &[FinancialTransaction], lang: &str) -> String {
    let lines: Vec<String> = recent
        .iter()
        .map(|tx| format!("- {}: {} ({:?})", tx.label, tx.amount, tx.category))
        .collect();

    format!(
        "Aja como um CFO especializado em oficinas de motocicletas.\n\
         Analise os seguintes dados financeiros e gere um relatório executivo:\n\n\
         Estatísticas Atuais:\n\
         - Receita Total: {}\n\
         - Custos Operacionais: {}\n\
         - Lucro Líquido: {}\n\
         - A Receber: {}\n\n\
         Transações Recentes:\n{}\n\n\
         O relatório deve conter:\n\
         1. Resumo da Saúde Financeira.\n\
         2. Principais Fontes de Receita vs Gastos.\n\
         3. Sugestão estratégica para aumentar a margem de lucro.\n\n\
         Responda em {} com formatação MARKDOWN profissional.",
        summary.revenue,
        summary.costs,
        summary.profit,
        summary.pending,
        lines.join("\n"),
        language_name(lang)
    )
}

fn ncm_prompt(product_name: &str) -> String {
    format!(
        "Identifique o código NCM (8 dígitos) para o seguinte produto de oficina de motos: \"{product_name}\".\n\
         Retorne APENAS um JSON plano com as chaves \"ncm\" e \"description\"."
    )
}

/// Lê o JSON do NCM. Aceita a resposta cercada por ```json ... ```.
fn parse_ncm(text: &str) -> Result<NcmSuggestion, AppError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let mut suggestion: NcmSuggestion = serde_json::from_str(body)
        .map_err(|e| AppError::AiProviderError(format!("JSON de NCM inválido: {}", e)))?;
    suggestion.ncm = suggestion.ncm.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    Ok(suggestion)
}

#[derive(Clone)]
pub struct AiService {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl AiService {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP da IA: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Diagnóstico em markdown a partir do sintoma e do modelo.
    pub async fn diagnose(&self, issue: &str, vehicle_model: &str, lang: &str) -> Result<String, AppError> {
        let config = GenerationConfig { temperature: Some(0.4), top_p: Some(0.8), ..Default::default() };
        self.generate(&diagnosis_prompt(issue, vehicle_model, lang), config).await
    }

    pub async fn financial_report(
        &self,
        summary: &FinancialSummary,
        recent: &[FinancialTransaction],
        lang: &str,
    ) -> Result<String, AppError> {
        let config = GenerationConfig { temperature: Some(0.7), ..Default::default() };
        self.generate(&financial_report_prompt(summary, recent, lang), config).await
    }

    pub async fn classify_ncm(&self, product_name: &str) -> Result<NcmSuggestion, AppError> {
        let config = GenerationConfig { response_mime_type: Some("application/json"), ..Default::default() };
        let text = self.generate(&ncm_prompt(product_name), config).await?;
        parse_ncm(&text)
    }

    async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or(AppError::AiNotConfigured)?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: config,
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Falha ao chamar a IA: {}", e);
                AppError::AiProviderError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("IA respondeu {}: {}", status, detail);
            return Err(AppError::AiProviderError(format!("HTTP {}", status)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiProviderError(format!("Resposta inválida: {}", e)))?;

        parsed
            .text()
            .ok_or_else(|| AppError::AiProviderError("Resposta vazia".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::models::finance::{TransactionCategory, TransactionStatus};

    fn gemini_reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
    }

    fn service(server: &MockServer) -> AiService {
        AiService::new(server.uri(), "gemini-test".into(), Some("chave-teste".into())).unwrap()
    }

    #[test]
    fn diagnosis_prompt_names_language_and_vehicle() {
        let prompt = diagnosis_prompt("falha na partida", "CB 500F", "en");
        assert!(prompt.contains("\"falha na partida\""));
        assert!(prompt.contains("\"CB 500F\""));
        assert!(prompt.contains("English"));
        assert!(diagnosis_prompt("x", "y", "pt").contains("Portuguese (Brazil)"));
    }

    #[test]
    fn report_prompt_lists_recent_transactions() {
        let summary = FinancialSummary {
            revenue: Decimal::from(1000),
            costs: Decimal::from(400),
            profit: Decimal::from(600),
            pending: Decimal::ZERO,
        };
        let tx = FinancialTransaction {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            label: "OS #123456 - João".into(),
            category: TransactionCategory::Income,
            amount: Decimal::from(250),
            status: TransactionStatus::Paid,
            payment_method: Some("CASH".into()),
            service_order_id: None,
            sale_id: None,
            date: Utc::now(),
            created_at: Utc::now(),
        };

        let prompt = financial_report_prompt(&summary, &[tx], "pt");
        assert!(prompt.contains("- OS #123456 - João: 250 (Income)"));
        assert!(prompt.contains("Receita Total: 1000"));
    }

    #[test]
    fn parses_fenced_ncm_json() {
        let s = parse_ncm("```json\n{\"ncm\": \"4011.40.00\", \"description\": \"Pneus para motocicletas\"}\n```").unwrap();
        assert_eq!(s.ncm, "4011.40.00");
        assert_eq!(s.description, "Pneus para motocicletas");
    }

    #[test]
    fn rejects_non_json_ncm() {
        assert!(matches!(parse_ncm("não sei"), Err(AppError::AiProviderError(_))));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let ai = AiService::new(DEFAULT_GEMINI_BASE_URL.into(), DEFAULT_GEMINI_MODEL.into(), Some("  ".into())).unwrap();
        assert!(!ai.is_configured());
        assert!(matches!(ai.diagnose("a", "b", "pt").await, Err(AppError::AiNotConfigured)));
    }

    #[tokio::test]
    async fn diagnose_returns_model_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "chave-teste"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("## Diagnóstico\nVela gasta")))
            .expect(1)
            .mount(&server)
            .await;

        let text = service(&server).diagnose("falha na partida", "CB 500F", "pt").await.unwrap();
        assert_eq!(text, "## Diagnóstico\nVela gasta");
    }

    #[tokio::test]
    async fn classify_ncm_reads_json_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gemini_reply(r#"{"ncm":"2710.19.32","description":"Óleo lubrificante"}"#)),
            )
            .mount(&server)
            .await;

        let suggestion = service(&server).classify_ncm("Óleo Motul 10W40").await.unwrap();
        assert_eq!(suggestion.ncm, "2710.19.32");
    }

    #[tokio::test]
    async fn provider_failure_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("quota"))
            .mount(&server)
            .await;

        let result = service(&server).diagnose("a", "b", "pt").await;
        assert!(matches!(result, Err(AppError::AiProviderError(_))));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        assert!(matches!(
            service(&server).diagnose("a", "b", "pt").await,
            Err(AppError::AiProviderError(_))
        ));
    }
}
