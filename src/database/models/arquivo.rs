use bson::Bson;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::api::format::bson_to_json;

/// Folder every stored file lives under inside the bucket
pub const STORAGE_FOLDER: &str = "arquivos";

/// Document from the `arquivos` collection
#[derive(Debug, Clone, Deserialize)]
pub struct Arquivo {
    #[serde(rename = "_id")]
    pub id: Bson,
    #[serde(default, deserialize_with = "lenient")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub local: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tipo: Option<String>,
    pub size: Option<Bson>,
}

/// Attachment object attached to media messages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anexo {
    pub nome: Option<String>,
    pub local: Option<String>,
    pub tipo: Option<String>,
    pub size: Value,
    pub url: String,
}

impl Arquivo {
    pub fn anexo(&self) -> Anexo {
        Anexo {
            nome: self.nome.clone(),
            local: self.local.clone(),
            tipo: self.tipo.clone(),
            size: self.size.clone().map(bson_to_json).unwrap_or(Value::Null),
            url: public_url(self.local.as_deref().unwrap_or_default()),
        }
    }
}

/// Public route for a stored path; a leading `arquivos/` is dropped so the
/// folder is not doubled.
pub fn public_url(local: &str) -> String {
    let relative = local
        .strip_prefix(STORAGE_FOLDER)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(local);
    format!("/{}/{}", STORAGE_FOLDER, relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_strips_redundant_folder() {
        assert_eq!(public_url("arquivos/2025-10/13/a.jpg"), "/arquivos/2025-10/13/a.jpg");
        assert_eq!(public_url("2025-10/13/a.jpg"), "/arquivos/2025-10/13/a.jpg");
        assert_eq!(public_url("arquivosx/a.jpg"), "/arquivos/arquivosx/a.jpg");
    }

    #[test]
    fn anexo_carries_size_and_url() {
        let arquivo = Arquivo {
            id: Bson::String("f1".into()),
            nome: Some("contrato.pdf".into()),
            local: Some("arquivos/2025-10/13/contrato.pdf".into()),
            tipo: Some("application/pdf".into()),
            size: Some(Bson::Int64(2048)),
        };
        let anexo = arquivo.anexo();
        assert_eq!(anexo.url, "/arquivos/2025-10/13/contrato.pdf");
        assert_eq!(anexo.size, Value::from(2048));
        assert_eq!(anexo.local.as_deref(), Some("arquivos/2025-10/13/contrato.pdf"));
    }

    #[test]
    fn mistyped_file_fields_do_not_fail_the_document() {
        let arquivo: Arquivo = bson::from_document(bson::doc! {
            "_id": "f2",
            "nome": ["a", "b"],
            "local": "2025-10/13/a.jpg",
            "tipo": 7_i32,
            "size": "2 KB",
        })
        .unwrap();

        assert_eq!(arquivo.nome, None);
        assert_eq!(arquivo.tipo, None);
        let anexo = arquivo.anexo();
        assert_eq!(anexo.url, "/arquivos/2025-10/13/a.jpg");
        assert_eq!(anexo.size, Value::from("2 KB"));
    }
}
