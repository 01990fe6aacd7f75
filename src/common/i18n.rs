// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Catálogos embutidos no binário
const PT: &str = include_str!("../../locales/pt.json");
const EN: &str = include_str!("../../locales/en.json");

/// Mensagens traduzidas, indexadas por idioma e chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> Self {
        let mut catalogs = HashMap::new();
        for (lang, raw) in [("pt", PT), ("en", EN)] {
            match serde_json::from_str::<HashMap<String, String>>(raw) {
                Ok(catalog) => {
                    catalogs.insert(lang.to_string(), catalog);
                }
                Err(e) => tracing::error!("Catálogo de idioma '{}' inválido: {}", lang, e),
            }
        }
        Self { catalogs }
    }

    /// Traduz a chave no idioma pedido, caindo para o padrão e, por fim, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_in_requested_language() {
        let store = I18nStore::load();
        assert_eq!(store.translate("en", "auth.invalid_credentials"), "Invalid email or password.");
        assert_eq!(store.translate("pt", "auth.invalid_credentials"), "E-mail ou senha inválidos.");
    }

    #[test]
    fn falls_back_to_portuguese_then_key() {
        let store = I18nStore::load();
        assert_eq!(store.translate("de", "auth.invalid_credentials"), "E-mail ou senha inválidos.");
        assert_eq!(store.translate("en", "nao.existe"), "nao.existe");
    }

    #[test]
    fn catalogs_share_the_same_keys() {
        let pt: HashMap<String, String> = serde_json::from_str(PT).unwrap();
        let en: HashMap<String, String> = serde_json::from_str(EN).unwrap();
        let mut pt_keys: Vec<_> = pt.keys().collect();
        let mut en_keys: Vec<_> = en.keys().collect();
        pt_keys.sort();
        en_keys.sort();
        assert_eq!(pt_keys, en_keys);
    }
}
