use bson::{doc, oid::ObjectId, Bson, Document};
use std::fmt;

/// Field names under which a message may reference its service record
pub const PARENT_FIELDS: [&str; 2] = ["id_atend", "id_rota"];

/// A record identifier as it may be stored: native ObjectId or plain string.
///
/// Every lookup that crosses collections goes through `RecordId` so that a
/// reference stored as a hex string joins a document whose `_id` is an
/// ObjectId, and the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Object(ObjectId),
    Text(String),
}

impl RecordId {
    /// 24-hex strings become ObjectIds, anything else stays text
    pub fn parse(raw: &str) -> Self {
        match ObjectId::parse_str(raw) {
            Ok(oid) => RecordId::Object(oid),
            Err(_) => RecordId::Text(raw.to_string()),
        }
    }

    /// Normalize a stored value. Empty strings and non-id types yield `None`.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::ObjectId(oid) => Some(RecordId::Object(*oid)),
            Bson::String(s) if !s.is_empty() => Some(Self::parse(s)),
            _ => None,
        }
    }

    /// Every stored representation this id may have
    pub fn candidates(&self) -> Vec<Bson> {
        match self {
            RecordId::Object(oid) => vec![Bson::ObjectId(*oid), Bson::String(oid.to_hex())],
            RecordId::Text(s) => vec![Bson::String(s.clone())],
        }
    }

    pub fn matches(&self, value: &Bson) -> bool {
        Self::from_bson(value).as_ref() == Some(self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Object(oid) => write!(f, "{}", oid.to_hex()),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// `{_id: {$in: [...]}}` over all representations
pub fn by_id_filter(id: &RecordId) -> Document {
    doc! { "_id": { "$in": id.candidates() } }
}

/// Batch variant used by the enrichment joins
pub fn by_ids_filter(ids: &[RecordId]) -> Document {
    let candidates: Vec<Bson> = ids.iter().flat_map(RecordId::candidates).collect();
    doc! { "_id": { "$in": candidates } }
}

/// Messages of a service record, whichever field holds the reference
pub fn parent_filter(id: &RecordId) -> Document {
    let branches: Vec<Document> = PARENT_FIELDS
        .iter()
        .map(|field| {
            let mut branch = Document::new();
            branch.insert(*field, doc! { "$in": id.candidates() });
            branch
        })
        .collect();
    doc! { "$or": branches }
}

/// True when any parent field of `message` references `id`
pub fn belongs_to(message: &Document, id: &RecordId) -> bool {
    PARENT_FIELDS
        .iter()
        .filter_map(|field| message.get(*field))
        .any(|value| id.matches(value))
}
