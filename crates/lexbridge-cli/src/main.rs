//! `lexbridge` command line: ingest documents, ask questions, check the
//! index.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use lexbridge_core::{
    CourtLevel, DocumentType, EngineConfig, Jurisdiction, Language, LegalDocument, ModelEndpoint,
    QuerySession, UserRole,
};
use lexbridge_engine::LegalEngine;

#[derive(Parser)]
#[command(
    name = "lexbridge",
    version,
    about = "Jurisdiction-grounded legal question answering"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConnectionOpts {
    /// Directory holding the vector index.
    #[arg(long, global = true, default_value = "./lexbridge-data")]
    index_path: PathBuf,

    /// Vector collection name.
    #[arg(long, global = true, default_value = "legal_documents")]
    collection: String,

    #[arg(
        long,
        global = true,
        env = "LEXBRIDGE_EMBED_URL",
        default_value = "https://api.openai.com"
    )]
    embed_url: String,

    #[arg(
        long,
        global = true,
        env = "LEXBRIDGE_EMBED_API_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    embed_api_key: String,

    #[arg(long, global = true, default_value = "text-embedding-3-small")]
    embed_model: String,

    #[arg(long, global = true, default_value_t = 1536)]
    embed_dim: usize,

    #[arg(
        long,
        global = true,
        env = "LEXBRIDGE_GEN_URL",
        default_value = "https://api.openai.com"
    )]
    gen_url: String,

    #[arg(
        long,
        global = true,
        env = "LEXBRIDGE_GEN_API_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    gen_api_key: String,

    #[arg(long, global = true, default_value = "gpt-4o-mini")]
    gen_model: String,

    /// Per-request timeout in seconds for remote calls.
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,
}

impl ConnectionOpts {
    fn to_config(&self) -> EngineConfig {
        EngineConfig {
            index_path: self.index_path.clone(),
            collection: self.collection.clone(),
            embedding: ModelEndpoint::new(&self.embed_url, &self.embed_api_key, &self.embed_model),
            embedding_dim: self.embed_dim,
            generation: ModelEndpoint::new(&self.gen_url, &self.gen_api_key, &self.gen_model),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..EngineConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Embed and index documents from a JSON file.
    Ingest {
        /// JSON array of legal document records.
        #[arg(long)]
        file: PathBuf,
    },

    /// Ask a question against the index.
    Query {
        question: String,

        #[arg(long)]
        jurisdiction: Jurisdiction,

        #[arg(long, default_value = "tenant")]
        role: UserRole,

        #[arg(long, default_value = "en")]
        language: Language,

        #[arg(long)]
        sub_jurisdiction: Option<String>,

        /// Restrict retrieval to these document types (repeatable).
        #[arg(long = "doc-type")]
        doc_types: Vec<DocumentType>,

        /// Restrict case-law retrieval to these court levels (repeatable).
        #[arg(long = "court-level")]
        court_levels: Vec<CourtLevel>,

        /// Allow clearly-marked statements from general knowledge.
        #[arg(long)]
        public_knowledge: bool,

        /// Maximum number of retrieved sources.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Report index availability and point count.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut config = cli.connection.to_config();

    match cli.command {
        Command::Ingest { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let docs: Vec<LegalDocument> =
                serde_json::from_str(&raw).context("parsing document records")?;

            let engine = LegalEngine::open(config).await;
            eprintln!("Ingesting {} documents...", docs.len());
            let stats = engine.ingest(docs).await?;
            eprintln!(
                "Indexed {} documents in {:.1}s",
                stats.indexed, stats.elapsed_secs
            );
        }

        Command::Query {
            question,
            jurisdiction,
            role,
            language,
            sub_jurisdiction,
            doc_types,
            court_levels,
            public_knowledge,
            limit,
        } => {
            config.search_limit = limit;
            let engine = LegalEngine::open(config).await;

            let mut session = QuerySession::new(question, jurisdiction, role, language);
            session.sub_jurisdiction = sub_jurisdiction;
            session.doc_types = doc_types;
            session.court_levels = court_levels;
            session.use_public_knowledge = public_knowledge;

            let resp = engine.answer(&session).await;

            if let Some(warning) = &resp.mismatch_warning {
                println!("! {warning}\n");
            }
            println!("{}", resp.answer);
            if resp.sources.is_empty() {
                println!("\n(no sources; answer is ungrounded)");
            } else {
                println!("\nSources:");
                for (i, source) in resp.sources.iter().enumerate() {
                    println!(
                        "  [{}] {} ({}, {}) {}",
                        i + 1,
                        source.title,
                        source.jurisdiction,
                        source.doc_type,
                        source.source_url
                    );
                }
            }
        }

        Command::Status => {
            let engine = LegalEngine::open(config).await;
            if engine.index().is_available() {
                let count = engine.index().count().await?;
                println!("index: available ({count} points)");
            } else {
                println!("index: unavailable (degraded mode)");
            }
        }
    }

    Ok(())
}
