use bson::Bson;
use serde::Deserialize;

use super::lenient;

/// Account allowed to log into the viewer (`usuarios_viewer`)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(rename = "_id")]
    pub id: Bson,
    pub username: String,
    #[serde(default, deserialize_with = "lenient")]
    pub nome: Option<String>,
    /// bcrypt hash
    pub password: String,
    #[serde(default)]
    pub ativo: bool,
}

impl LoginUser {
    /// Id as carried in token claims
    pub fn id_string(&self) -> String {
        match &self.id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Attendant referenced by messages (`usuarios`), only the name is read
#[derive(Debug, Clone, Deserialize)]
pub struct Atendente {
    #[serde(rename = "_id")]
    pub id: Bson,
    #[serde(default, deserialize_with = "lenient")]
    pub nome: Option<String>,
}
