use std::collections::HashSet;

use bson::{Bson, Document};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::format::document_to_json;
use crate::database::{AtendimentoRepository, RecordId};

/// Message field holding the attendant reference
pub const ATTENDANT_FIELD: &str = "id_atend";
/// Message field holding the file reference of media messages
pub const FILE_FIELD: &str = "objeto";
pub const MEDIA_TYPE: &str = "midia";

/// Render a page of messages with `atendenteNome` and, for media messages,
/// `arquivo`. Each join is best effort: a failed lookup is logged and the
/// messages go out without that field.
pub async fn enrich_mensagens(repository: &dyn AtendimentoRepository, mensagens: Vec<Document>) -> Vec<Map<String, Value>> {
    let attendant_ids = distinct(mensagens.iter().filter_map(|m| m.get(ATTENDANT_FIELD)));
    let file_ids = distinct(
        mensagens
            .iter()
            .filter(|m| is_media(m))
            .filter_map(|m| m.get(FILE_FIELD)),
    );

    let attendant_names = match repository.find_attendant_names(&attendant_ids).await {
        Ok(names) => {
            debug!(requested = attendant_ids.len(), found = names.len(), "Attendant names resolved");
            Some(names)
        }
        Err(e) => {
            warn!(error = %e, "Failed to enrich messages with attendant names");
            None
        }
    };

    let arquivos = match repository.find_arquivos(&file_ids).await {
        Ok(found) => {
            debug!(requested = file_ids.len(), found = found.len(), "Media files resolved");
            Some(found)
        }
        Err(e) => {
            warn!(error = %e, "Failed to enrich messages with files");
            None
        }
    };

    mensagens
        .into_iter()
        .map(|mensagem| {
            let attendant = mensagem.get(ATTENDANT_FIELD).and_then(RecordId::from_bson);
            let arquivo = is_media(&mensagem)
                .then(|| mensagem.get(FILE_FIELD).and_then(RecordId::from_bson))
                .flatten()
                .and_then(|id| arquivos.as_ref()?.get(&id))
                .map(|arquivo| arquivo.anexo());

            let mut json = document_to_json(mensagem);

            if let Some(names) = &attendant_names {
                let nome = attendant
                    .and_then(|id| names.get(&id).cloned())
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                json.insert("atendenteNome".to_string(), nome);
            }

            if let Some(anexo) = arquivo {
                match serde_json::to_value(&anexo) {
                    Ok(value) => {
                        json.insert("arquivo".to_string(), value);
                    }
                    Err(e) => warn!(error = %e, "Failed to serialize attachment"),
                }
            }

            json
        })
        .collect()
}

fn is_media(mensagem: &Document) -> bool {
    mensagem.get_str("tipo").is_ok_and(|tipo| tipo == MEDIA_TYPE)
}

fn distinct<'a>(values: impl Iterator<Item = &'a Bson>) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    values
        .filter_map(RecordId::from_bson)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
