use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::api::format::{bson_to_json, iso_millis};

/// Suffix the messaging channel appends to phone numbers
pub const CHANNEL_SUFFIX: &str = "@c.us";

pub fn normalize_phone(canal_cliente: &str) -> String {
    canal_cliente.replace(CHANNEL_SUFFIX, "")
}

/// Contact derived from service records, never stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contato {
    /// Channel identifier as stored (`canal_cliente`)
    pub id: String,
    pub telefone: String,
    pub nome: Option<String>,
    pub id_user: Option<Value>,
    #[serde(rename = "ultimoAtendimento", serialize_with = "iso_millis")]
    pub ultimo_atendimento: Option<DateTime<Utc>>,
    #[serde(rename = "totalAtendimentos")]
    pub total_atendimentos: i64,
    pub status: Option<Value>,
}

/// Row shape produced by the contact aggregation
#[derive(Debug, Deserialize)]
pub struct ContatoRow {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub telefone: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub nome: Option<String>,
    pub id_user: Option<Bson>,
    #[serde(rename = "ultimoAtendimento", default, deserialize_with = "lenient")]
    pub ultimo_atendimento: Option<bson::DateTime>,
    #[serde(rename = "totalAtendimentos", default, deserialize_with = "lenient")]
    pub total_atendimentos: Option<i64>,
    pub status: Option<Bson>,
}

impl From<ContatoRow> for Contato {
    fn from(row: ContatoRow) -> Self {
        Self {
            id: row.id,
            telefone: row.telefone.unwrap_or_default(),
            nome: row.nome,
            id_user: row.id_user.map(bson_to_json),
            ultimo_atendimento: row.ultimo_atendimento.map(|dt| dt.to_chrono()),
            total_atendimentos: row.total_atendimentos.unwrap_or_default(),
            status: row.status.map(bson_to_json),
        }
    }
}
