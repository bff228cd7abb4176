use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};

use super::date_window::{DateWindow, END_FIELD, START_FIELD};
use super::error::FilterError;

/// Service history of one contact, narrowed by protocol and date window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    pub canal_cliente: String,
    pub protocolo: Option<String>,
    pub window: Option<DateWindow>,
}

impl HistoryFilter {
    pub fn new(
        canal_cliente: impl Into<String>,
        protocolo: Option<&str>,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            canal_cliente: canal_cliente.into(),
            protocolo: protocolo
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            window: DateWindow::from_query(data_inicio, data_fim)?,
        })
    }

    pub fn matches(&self, record: &Document) -> bool {
        if record.get_str("canal_cliente").ok() != Some(self.canal_cliente.as_str()) {
            return false;
        }

        if let Some(protocolo) = &self.protocolo {
            let found = record
                .get_str("protocolo")
                .map(|p| p.to_lowercase().contains(&protocolo.to_lowercase()))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }

        match &self.window {
            Some(window) => window.overlaps(datetime(record, START_FIELD), datetime(record, END_FIELD)),
            None => true,
        }
    }

    /// All parts combined with `$and`
    pub fn to_document(&self) -> Document {
        let mut clauses: Vec<Bson> = vec![Bson::Document(doc! { "canal_cliente": self.canal_cliente.as_str() })];

        if let Some(protocolo) = &self.protocolo {
            clauses.push(Bson::Document(doc! {
                "protocolo": { "$regex": regex::escape(protocolo), "$options": "i" }
            }));
        }

        if let Some(window) = &self.window {
            clauses.push(Bson::Document(window.to_document()));
        }

        doc! { "$and": clauses }
    }
}

fn datetime(record: &Document, field: &str) -> Option<DateTime<Utc>> {
    record.get_datetime(field).ok().map(|dt| dt.to_chrono())
}
