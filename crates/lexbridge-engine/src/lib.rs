pub mod error;
pub mod ingest;
pub mod pipeline;

pub use error::EngineError;
pub use ingest::IngestStats;
pub use pipeline::LegalEngine;
