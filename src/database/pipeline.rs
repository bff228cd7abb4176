//! Aggregation pipelines built as plain data so their shape can be tested
//! without a server.

use bson::{doc, Document};

use crate::api::PageRequest;
use crate::database::models::{contato::CHANNEL_SUFFIX, CLIENTES};
use crate::filter::ContactSearch;

/// Group service records into contacts, join the user name, filter, sort.
///
/// The search runs after projection because it matches the derived `telefone`
/// and `nome` fields.
pub fn contatos_pipeline(search: Option<&ContactSearch>) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$match": { "canal_cliente": { "$exists": true, "$ne": null } } },
        doc! {
            "$group": {
                "_id": "$canal_cliente",
                "id_user": { "$first": "$id_user" },
                "ultimoAtendimento": { "$max": "$date" },
                "totalAtendimentos": { "$sum": 1 },
                "status": { "$last": "$status" },
            }
        },
        doc! {
            "$lookup": {
                "from": CLIENTES,
                "localField": "id_user",
                "foreignField": "_id",
                "as": "usuario",
            }
        },
        doc! {
            "$addFields": {
                "telefone": {
                    "$replaceAll": { "input": "$_id", "find": CHANNEL_SUFFIX, "replacement": "" }
                },
                "nome": { "$arrayElemAt": ["$usuario.nome", 0] },
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "id": "$_id",
                "telefone": 1,
                "nome": 1,
                "id_user": 1,
                "ultimoAtendimento": 1,
                "totalAtendimentos": 1,
                "status": 1,
            }
        },
    ];

    if let Some(search) = search {
        pipeline.push(search.to_match_stage());
    }

    pipeline.push(doc! { "$sort": { "ultimoAtendimento": -1 } });
    pipeline
}

/// Same filter, reduced to `{total: n}`; yields no document when nothing matches
pub fn contatos_count_pipeline(search: Option<&ContactSearch>) -> Vec<Document> {
    let mut pipeline = contatos_pipeline(search);
    pipeline.push(doc! { "$count": "total" });
    pipeline
}

pub fn contatos_page_pipeline(search: Option<&ContactSearch>, page: PageRequest) -> Vec<Document> {
    let mut pipeline = contatos_pipeline(search);
    pipeline.push(doc! { "$skip": page.skip_i64() });
    pipeline.push(doc! { "$limit": page.limit as i64 });
    pipeline
}
