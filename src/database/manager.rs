use bson::doc;
use mongodb::{Client, Database};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the document store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// Owns the process-wide document store connection
pub struct DatabaseManager {
    client: Client,
    database: Database,
}

impl DatabaseManager {
    /// Connect and ping once; a failure here is fatal for the server
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let database = client.database(&config.name);

        database.run_command(doc! { "ping": 1 }, None).await?;
        info!(database = %config.name, "Connected to document store");

        Ok(Self { client, database })
    }

    /// Handle for repositories; cheap to clone
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    pub async fn shutdown(self) {
        info!("Closing document store connection");
        self.client.shutdown().await;
    }
}
