pub mod manager;
pub mod models;
pub mod pipeline;
pub mod record_id;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use record_id::RecordId;
pub use repository::{AtendimentoRepository, MongoRepository, Page};
