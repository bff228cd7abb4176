use std::collections::HashMap;

use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{options::FindOptions, Database};
use tracing::{debug, warn};

use crate::api::PageRequest;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Arquivo, Atendente, Contato, ContatoRow, LoginUser, ARQUIVOS, ATENDENTES, ATENDIMENTOS, MENSAGENS,
    USUARIOS_VIEWER,
};
use crate::database::pipeline;
use crate::database::record_id::{by_id_filter, by_ids_filter, parent_filter, RecordId};
use crate::filter::{ContactSearch, HistoryFilter};

/// One page of results plus the unpaginated total
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Read access to service records and everything joined to them.
///
/// Handlers only see this trait; the server wires in `MongoRepository`, tests
/// wire in an in-memory double.
#[async_trait]
pub trait AtendimentoRepository: Send + Sync {
    /// Active viewer account by username
    async fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, DatabaseError>;

    async fn list_contatos(
        &self,
        search: Option<&ContactSearch>,
        page: PageRequest,
    ) -> Result<Page<Contato>, DatabaseError>;

    /// Newest first
    async fn list_atendimentos(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError>;

    async fn find_atendimento(&self, id: &RecordId) -> Result<Option<Document>, DatabaseError>;

    /// Oldest first
    async fn list_mensagens(
        &self,
        atendimento: &RecordId,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError>;

    async fn find_attendant_names(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, String>, DatabaseError>;

    async fn find_arquivos(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Arquivo>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub struct MongoRepository {
    db: Database,
}

impl MongoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn documents(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(name)
    }

    async fn find_page(
        &self,
        collection: &str,
        filter: Document,
        sort: Document,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError> {
        let collection = self.documents(collection);
        let total = collection.count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(sort)
            .skip(page.skip_i64() as u64)
            .limit(page.limit as i64)
            .build();
        let items: Vec<Document> = collection.find(filter, options).await?.try_collect().await?;

        Ok(Page::new(items, total))
    }
}

#[async_trait]
impl AtendimentoRepository for MongoRepository {
    async fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, DatabaseError> {
        let user = self
            .db
            .collection::<LoginUser>(USUARIOS_VIEWER)
            .find_one(doc! { "username": username, "ativo": true }, None)
            .await?;
        Ok(user)
    }

    async fn list_contatos(
        &self,
        search: Option<&ContactSearch>,
        page: PageRequest,
    ) -> Result<Page<Contato>, DatabaseError> {
        let atendimentos = self.documents(ATENDIMENTOS);

        let counted: Vec<Document> = atendimentos
            .aggregate(pipeline::contatos_count_pipeline(search), None)
            .await?
            .try_collect()
            .await?;
        let total = counted
            .first()
            .and_then(|row| row.get("total"))
            .and_then(|value| value.as_i64().or_else(|| value.as_i32().map(i64::from)))
            .unwrap_or(0)
            .max(0) as u64;

        let rows: Vec<Document> = atendimentos
            .aggregate(pipeline::contatos_page_pipeline(search, page), None)
            .await?
            .try_collect()
            .await?;
        let items: Vec<Contato> = rows
            .into_iter()
            .filter_map(|row| match bson::from_document::<ContatoRow>(row) {
                Ok(row) => Some(Contato::from(row)),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable contact row");
                    None
                }
            })
            .collect();

        debug!(total, returned = items.len(), "Listed contacts");
        Ok(Page::new(items, total))
    }

    async fn list_atendimentos(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError> {
        self.find_page(ATENDIMENTOS, filter.to_document(), doc! { "date": -1 }, page)
            .await
    }

    async fn find_atendimento(&self, id: &RecordId) -> Result<Option<Document>, DatabaseError> {
        let record = self.documents(ATENDIMENTOS).find_one(by_id_filter(id), None).await?;
        Ok(record)
    }

    async fn list_mensagens(
        &self,
        atendimento: &RecordId,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError> {
        self.find_page(MENSAGENS, parent_filter(atendimento), doc! { "data": 1 }, page)
            .await
    }

    async fn find_attendant_names(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, String>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let options = FindOptions::builder().projection(doc! { "nome": 1 }).build();
        let atendentes: Vec<Atendente> = self
            .db
            .collection::<Atendente>(ATENDENTES)
            .find(by_ids_filter(ids), options)
            .await?
            .try_collect()
            .await?;

        Ok(atendentes
            .into_iter()
            .filter_map(|a| Some((RecordId::from_bson(&a.id)?, a.nome?)))
            .collect())
    }

    async fn find_arquivos(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Arquivo>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let arquivos: Vec<Arquivo> = self
            .db
            .collection::<Arquivo>(ARQUIVOS)
            .find(by_ids_filter(ids), None)
            .await?
            .try_collect()
            .await?;

        Ok(arquivos
            .into_iter()
            .filter_map(|a| Some((RecordId::from_bson(&a.id)?, a)))
            .collect())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
