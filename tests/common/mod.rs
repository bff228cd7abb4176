#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;

use atendimentos_api::api::format::bson_to_json;
use atendimentos_api::api::PageRequest;
use atendimentos_api::app::{router, AppState};
use atendimentos_api::auth::{generate_jwt, Claims};
use atendimentos_api::config::AppConfig;
use atendimentos_api::database::models::{normalize_phone, Arquivo, Contato, LoginUser};
use atendimentos_api::database::record_id::belongs_to;
use atendimentos_api::database::{AtendimentoRepository, DatabaseError, Page, RecordId};
use atendimentos_api::filter::{ContactSearch, HistoryFilter};
use atendimentos_api::storage::{ObjectStore, ObjectSummary, StorageError, StoredObject};

pub const JWT_SECRET: &str = "integration-secret";
pub const VIEWER_PASSWORD: &str = "s3nha-forte";

// ---------------------------------------------------------------------------
// In-memory document store
// ---------------------------------------------------------------------------

/// Collections held as plain documents; queries evaluate the same predicates
/// the document-store filters are built from.
#[derive(Default)]
pub struct MemoryRepository {
    pub atendimentos: Vec<Document>,
    pub mensagens: Vec<Document>,
    pub arquivos: Vec<Document>,
    pub atendentes: Vec<Document>,
    pub clientes: Vec<Document>,
    pub viewers: Vec<Document>,
    pub calls: AtomicUsize,
    pub fail_ping: AtomicBool,
    pub fail_attendants: AtomicBool,
    pub fail_arquivos: AtomicBool,
}

impl MemoryRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn contato(&self, canal: &str, records: &[&Document]) -> Contato {
        let id_user = records.first().and_then(|r| r.get("id_user")).cloned();
        let nome = id_user.as_ref().and_then(|id| {
            self.clientes
                .iter()
                .find(|c| c.get("_id") == Some(id))
                .and_then(|c| c.get_str("nome").ok())
                .map(str::to_string)
        });

        Contato {
            id: canal.to_string(),
            telefone: normalize_phone(canal),
            nome,
            id_user: id_user.map(bson_to_json),
            ultimo_atendimento: records
                .iter()
                .filter_map(|r| r.get_datetime("date").ok())
                .map(|dt| dt.to_chrono())
                .max(),
            total_atendimentos: records.len() as i64,
            status: records.last().and_then(|r| r.get("status")).cloned().map(bson_to_json),
        }
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.skip() as usize)
        .take(page.limit as usize)
        .collect();
    Page::new(items, total)
}

fn millis(doc: &Document, field: &str) -> Option<i64> {
    doc.get_datetime(field).ok().map(|dt| dt.timestamp_millis())
}

fn by_ids(docs: &[Document], ids: &[RecordId]) -> Vec<(RecordId, Document)> {
    docs.iter()
        .filter_map(|d| Some((RecordId::from_bson(d.get("_id")?)?, d.clone())))
        .filter(|(id, _)| ids.contains(id))
        .collect()
}

#[async_trait]
impl AtendimentoRepository for MemoryRepository {
    async fn find_login_user(&self, username: &str) -> Result<Option<LoginUser>, DatabaseError> {
        self.touch();
        self.viewers
            .iter()
            .find(|u| u.get_str("username").ok() == Some(username) && u.get_bool("ativo").ok() == Some(true))
            .map(|u| bson::from_document::<LoginUser>(u.clone()))
            .transpose()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }

    async fn list_contatos(
        &self,
        search: Option<&ContactSearch>,
        page: PageRequest,
    ) -> Result<Page<Contato>, DatabaseError> {
        self.touch();
        let mut groups: Vec<(String, Vec<&Document>)> = Vec::new();
        for record in &self.atendimentos {
            let Ok(canal) = record.get_str("canal_cliente") else {
                continue;
            };
            match groups.iter_mut().find(|(c, _)| c.as_str() == canal) {
                Some((_, records)) => records.push(record),
                None => groups.push((canal.to_string(), vec![record])),
            }
        }

        let mut contatos: Vec<Contato> = groups
            .iter()
            .map(|(canal, records)| self.contato(canal, records))
            .filter(|c| search.map_or(true, |s| s.matches(c)))
            .collect();
        contatos.sort_by(|a, b| b.ultimo_atendimento.cmp(&a.ultimo_atendimento));

        Ok(paginate(contatos, page))
    }

    async fn list_atendimentos(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError> {
        self.touch();
        let mut records: Vec<Document> = self
            .atendimentos
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(millis(r, "date")));
        Ok(paginate(records, page))
    }

    async fn find_atendimento(&self, id: &RecordId) -> Result<Option<Document>, DatabaseError> {
        self.touch();
        Ok(self
            .atendimentos
            .iter()
            .find(|r| r.get("_id").is_some_and(|value| id.matches(value)))
            .cloned())
    }

    async fn list_mensagens(
        &self,
        atendimento: &RecordId,
        page: PageRequest,
    ) -> Result<Page<Document>, DatabaseError> {
        self.touch();
        let mut mensagens: Vec<Document> = self
            .mensagens
            .iter()
            .filter(|m| belongs_to(m, atendimento))
            .cloned()
            .collect();
        mensagens.sort_by_key(|m| millis(m, "data"));
        Ok(paginate(mensagens, page))
    }

    async fn find_attendant_names(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, String>, DatabaseError> {
        self.touch();
        if self.fail_attendants.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("usuarios offline".into()));
        }
        Ok(by_ids(&self.atendentes, ids)
            .into_iter()
            .filter_map(|(id, doc)| Some((id, doc.get_str("nome").ok()?.to_string())))
            .collect())
    }

    async fn find_arquivos(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Arquivo>, DatabaseError> {
        self.touch();
        if self.fail_arquivos.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("arquivos offline".into()));
        }
        by_ids(&self.arquivos, ids)
            .into_iter()
            .map(|(id, doc)| -> Result<(RecordId, Arquivo), DatabaseError> {
                Ok((id, bson::from_document::<Arquivo>(doc).map_err(|e| DatabaseError::QueryError(e.to_string()))?))
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("ping failed".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory object store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryObjectStore {
    pub objects: HashMap<String, Bytes>,
}

impl MemoryObjectStore {
    pub fn with(mut self, key: &str, body: &[u8]) -> Self {
        self.objects.insert(key.to_string(), Bytes::copy_from_slice(body));
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let body = self
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        // Several chunks so the response really streams
        let chunks: Vec<Result<Bytes, StorageError>> =
            body.chunks(4).map(|c| Ok(Bytes::copy_from_slice(c))).collect();

        Ok(StoredObject {
            key: key.to_string(),
            content_length: Some(body.len() as u64),
            body: futures::stream::iter(chunks).boxed(),
        })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut found: Vec<ObjectSummary> = self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, body)| ObjectSummary {
                key: key.clone(),
                size: body.len() as i64,
                last_modified: None,
            })
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    fn endpoint(&self) -> &str {
        "memory://"
    }

    fn bucket(&self) -> &str {
        "primazzo"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Ids {
    pub ana: ObjectId,
    pub carla: ObjectId,
    pub open_record: ObjectId,
    pub closed_record: ObjectId,
    pub contrato: ObjectId,
}

pub const ANA_CANAL: &str = "5547988359194@c.us";
pub const BRUNO_CANAL: &str = "5511911112222@c.us";
pub const LEGACY_ID: &str = "legacy-atendimento-2";

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> bson::DateTime {
    bson::DateTime::from_chrono(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap())
}

/// Two contacts, three service records (one open, one keyed by a plain
/// string), four messages and one stored file.
pub fn seeded() -> (MemoryRepository, Ids) {
    let ids = Ids {
        ana: ObjectId::new(),
        carla: ObjectId::new(),
        open_record: ObjectId::new(),
        closed_record: ObjectId::new(),
        contrato: ObjectId::new(),
    };

    let password = bcrypt::hash(VIEWER_PASSWORD, 4).expect("hash");

    let repo = MemoryRepository {
        clientes: vec![doc! { "_id": ids.ana, "nome": "Ana Maria Souza" }],
        atendentes: vec![doc! { "_id": ids.carla, "nome": "Carla" }],
        viewers: vec![
            doc! {
                "_id": ObjectId::new(),
                "username": "viewer",
                "nome": "Visualizador",
                "password": password.clone(),
                "ativo": true,
            },
            doc! {
                "_id": ObjectId::new(),
                "username": "inativo",
                "nome": "Antigo",
                "password": password,
                "ativo": false,
            },
        ],
        atendimentos: vec![
            doc! {
                "_id": ids.open_record,
                "canal_cliente": ANA_CANAL,
                "id_user": ids.ana,
                "date": at(2024, 1, 5, 9, 0),
                "fim": Bson::Null,
                "status": "aberto",
                "protocolo": "2024-ABC-001",
            },
            doc! {
                "_id": LEGACY_ID,
                "canal_cliente": ANA_CANAL,
                "id_user": ids.ana,
                "date": at(2023, 12, 1, 14, 0),
                "fim": at(2023, 12, 2, 10, 0),
                "status": "finalizado",
                "protocolo": "2023-XYZ-002",
            },
            doc! {
                "_id": ids.closed_record,
                "canal_cliente": BRUNO_CANAL,
                "date": at(2024, 1, 8, 11, 0),
                "fim": at(2024, 1, 8, 15, 30),
                "status": "finalizado",
                "protocolo": "2024-DEF-003",
            },
        ],
        mensagens: vec![
            // Deliberately out of chronological order
            doc! {
                "id_atend": ids.open_record,
                "tipo": "midia",
                "objeto": ObjectId::new(),
                "data": at(2024, 1, 5, 9, 10),
            },
            doc! {
                "id_rota": ids.open_record,
                "id_atend": ids.carla,
                "tipo": "texto",
                "texto": "Olá, em que posso ajudar?",
                "data": at(2024, 1, 5, 9, 1),
            },
            doc! {
                "id_rota": ids.open_record.to_hex(),
                "tipo": "midia",
                "objeto": ids.contrato.to_hex(),
                "data": at(2024, 1, 5, 9, 5),
            },
            doc! {
                "id_rota": LEGACY_ID,
                "tipo": "texto",
                "texto": "Atendimento antigo",
                "data": at(2023, 12, 1, 14, 1),
            },
        ],
        arquivos: vec![doc! {
            "_id": ids.contrato,
            "nome": "contrato.pdf",
            "local": "arquivos/2025-10/13/contrato.pdf",
            "tipo": "application/pdf",
            "size": 2048_i64,
        }],
        ..Default::default()
    };

    (repo, ids)
}

pub fn seeded_store() -> MemoryObjectStore {
    MemoryObjectStore::default()
        .with("arquivos/2025-10/13/contrato.pdf", b"%PDF-1.4 contrato de teste")
        .with("arquivos/2025-10/13/FOTO.JPG", b"\xff\xd8\xff\xe0 jpeg")
        .with("arquivos/2025-11/02/audio.opus", b"OggS opus")
        .with("outros/ignorado.txt", b"fora da pasta")
}

// ---------------------------------------------------------------------------
// Server harness
// ---------------------------------------------------------------------------

pub fn test_config(extra: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = [
        ("MONGODB_URI", "mongodb://unused"),
        ("MINIO_ACCESS_KEY", "access"),
        ("MINIO_SECRET_KEY", "secret"),
        ("JWT_SECRET", JWT_SECRET),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Ok(AppConfig::from_map(&vars)?)
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub repository: Arc<MemoryRepository>,
    pub storage: Arc<MemoryObjectStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with a valid token
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token_for("viewer", JWT_SECRET)?)
            .send()
            .await?)
    }
}

pub async fn spawn_with(
    config: AppConfig,
    repository: MemoryRepository,
    storage: MemoryObjectStore,
) -> Result<TestApp> {
    let repository = Arc::new(repository);
    let storage = Arc::new(storage);

    let state = AppState::new(config, repository.clone(), storage.clone());
    let base_url = serve(state).await?;

    Ok(TestApp {
        base_url,
        client: reqwest::Client::new(),
        repository,
        storage,
    })
}

/// Serve an arbitrary state in the background, returning its base URL
pub async fn serve(state: AppState) -> Result<String> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let app = router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

/// Server over the seeded fixtures
pub async fn spawn_app() -> Result<(TestApp, Ids)> {
    let (repository, ids) = seeded();
    let app = spawn_with(test_config(&[])?, repository, seeded_store()).await?;
    Ok((app, ids))
}

pub fn token_for(username: &str, secret: &str) -> Result<String> {
    let claims = Claims::new(username.to_string(), Some("Visualizador".into()), "u1".into(), 24);
    Ok(generate_jwt(&claims, secret)?)
}

pub fn expired_token() -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        username: "viewer".into(),
        nome: None,
        user_id: "u1".into(),
        iat: now - 7200,
        exp: now - 3600,
    };
    Ok(generate_jwt(&claims, JWT_SECRET)?)
}
