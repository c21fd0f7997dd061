pub mod config;
pub mod detector;
pub mod types;

pub use config::{EngineConfig, ModelEndpoint};
pub use types::{
    AdHocDocument, CourtLevel, DocumentType, Jurisdiction, Language, LegalDocument, ParseError,
    QueryResponse, QuerySession, UserRole,
};
