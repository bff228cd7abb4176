pub mod enrichment;

pub use enrichment::enrich_mensagens;
