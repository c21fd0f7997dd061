pub mod embedder;
pub mod error;
pub mod generator;
pub mod prompts;
pub mod verdict;

pub use embedder::{RemoteEmbedder, TextEmbedder, embedding_input};
pub use error::AiError;
pub use generator::{RemoteGenerator, TextGenerator};
pub use verdict::{Verdict, parse_verdict};
