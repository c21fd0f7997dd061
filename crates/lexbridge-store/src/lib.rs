pub mod error;
pub mod filter;
pub mod index;
pub mod schema;

pub use error::StoreError;
pub use filter::SearchFilter;
pub use index::VectorIndex;
