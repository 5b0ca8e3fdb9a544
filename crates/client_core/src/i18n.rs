//! Locale dictionaries and the error-message tables that live inside them.

use std::collections::BTreeMap;

use floor_shared::locale::Locale;
use serde::Deserialize;

use crate::error::ClientError;

const PL: &str = include_str!("../dict/pl.json");
const DE: &str = include_str!("../dict/de.json");
const EN: &str = include_str!("../dict/en.json");
const TL: &str = include_str!("../dict/tl.json");
const UK: &str = include_str!("../dict/uk.json");
const BE: &str = include_str!("../dict/be.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictionary {
    pub login: LoginText,
    pub oven: OvenText,
    pub inventory: InventoryText,
    pub report_fault_dialog: ConfirmText,
    pub finish_fault_dialog: FinishFaultText,
    pub delete_dialog: ConfirmText,
    pub errors: ErrorTables,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginText {
    pub title: String,
    pub identifier_label: String,
    pub submit: String,
    pub logout: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvenText {
    pub select_oven: String,
    pub select_program: String,
    pub loading: String,
    pub process_list: String,
    pub active_fault: String,
    pub no_active_fault: String,
    pub retry: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryText {
    pub new_card: String,
    pub choose_card: String,
    pub create_card: String,
    pub no_cards: String,
    pub select_position: String,
    pub new_position: String,
    pub card_number: String,
    pub position_detail: String,
    pub config_error: String,
    pub yes: String,
    pub no: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmText {
    pub title: String,
    pub description: String,
    pub cancel: String,
    pub confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishFaultText {
    pub title: String,
    pub description: String,
    pub cancel: String,
    pub confirm: String,
    pub start_time: String,
    pub reported_by: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTables {
    pub login: ErrorTable,
    pub create_card: ErrorTable,
    pub fault: ErrorTable,
    pub delete: ErrorTable,
    pub fetch: ErrorTable,
}

/// Fixed lookup from gateway error tags to user-facing text.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorTable {
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    pub default: String,
}

impl ErrorTable {
    pub fn message(&self, err: &ClientError) -> String {
        match err {
            ClientError::Gateway(gateway) => self
                .messages
                .get(&gateway.tag)
                .cloned()
                .unwrap_or_else(|| self.default.clone()),
            ClientError::Validation(validation) => validation.to_string(),
            ClientError::Network(_) | ClientError::Persistence(_) => self.default.clone(),
        }
    }
}

impl Dictionary {
    pub fn for_locale(locale: Locale) -> serde_json::Result<Self> {
        let raw = match locale {
            Locale::Pl => PL,
            Locale::De => DE,
            Locale::En => EN,
            Locale::Tl => TL,
            Locale::Uk => UK,
            Locale::Be => BE,
        };
        serde_json::from_str(raw)
    }

    /// Resolves a raw locale code; unsupported codes get the default locale.
    pub fn for_code(code: &str) -> serde_json::Result<(Locale, Self)> {
        let locale = Locale::resolve(code);
        Ok((locale, Self::for_locale(locale)?))
    }
}
