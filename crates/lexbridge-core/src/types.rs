//! Contract types shared between the ingestion collaborators, the query
//! pipeline, and the vector store.
//!
//! Jurisdiction, role, document type, and court level are closed enums with
//! exhaustive matching downstream, so adding a variant is a compile-checked
//! change rather than a silently-ignored string.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failed to parse an enumerated value from its string code.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

/// A legal system scope that documents and answers are exclusively
/// attributed to.
///
/// Always assigned by the ingesting collaborator. The core never infers a
/// document's jurisdiction from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    #[serde(rename = "DE")]
    De,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "ES")]
    Es,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 3] = [Jurisdiction::De, Jurisdiction::Us, Jurisdiction::Es];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "DE",
            Self::Us => "US",
            Self::Es => "ES",
        }
    }

    /// Human-readable name used in prompts and warnings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::De => "Germany",
            Self::Us => "United States",
            Self::Es => "Spain",
        }
    }
}

impl FromStr for Jurisdiction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DE" => Ok(Self::De),
            "US" => Ok(Self::Us),
            "ES" => Ok(Self::Es),
            _ => Err(ParseError {
                kind: "jurisdiction",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The perspective a question is asked from. Each role shifts the emphasis
/// of the composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Investor,
    Landlord,
    Tenant,
    Owner,
    Manager,
    Lawyer,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::Investor,
        UserRole::Landlord,
        UserRole::Tenant,
        UserRole::Owner,
        UserRole::Manager,
        UserRole::Lawyer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investor => "investor",
            Self::Landlord => "landlord",
            Self::Tenant => "tenant",
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Lawyer => "lawyer",
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "investor" => Ok(Self::Investor),
            "landlord" => Ok(Self::Landlord),
            "tenant" => Ok(Self::Tenant),
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "lawyer" => Ok(Self::Lawyer),
            _ => Err(ParseError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of legal source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Statute,
    CaseLaw,
    Regulation,
    Commentary,
    Guidance,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statute => "statute",
            Self::CaseLaw => "case_law",
            Self::Regulation => "regulation",
            Self::Commentary => "commentary",
            Self::Guidance => "guidance",
        }
    }
}

impl FromStr for DocumentType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "statute" => Ok(Self::Statute),
            "case_law" | "case-law" => Ok(Self::CaseLaw),
            "regulation" => Ok(Self::Regulation),
            "commentary" => Ok(Self::Commentary),
            "guidance" => Ok(Self::Guidance),
            _ => Err(ParseError {
                kind: "document type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Court level of a case-law document. Only meaningful when the document
/// type is case law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtLevel {
    District,
    Appellate,
    Supreme,
    Constitutional,
}

impl CourtLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::District => "district",
            Self::Appellate => "appellate",
            Self::Supreme => "supreme",
            Self::Constitutional => "constitutional",
        }
    }
}

impl FromStr for CourtLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "district" => Ok(Self::District),
            "appellate" => Ok(Self::Appellate),
            "supreme" => Ok(Self::Supreme),
            "constitutional" => Ok(Self::Constitutional),
            _ => Err(ParseError {
                kind: "court level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CourtLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response language of a query session.
///
/// Closed enum because the Cultural Bridge blocks and the fixed fallback
/// sentences are pre-authored per language, not generated. The language of
/// an indexed document stays a free string code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "de")]
    De,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::De, Language::En, Language::Es];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::De => "German",
            Self::En => "English",
            Self::Es => "Spanish",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(ParseError {
                kind: "language",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retrievable unit of law or case text.
///
/// Created by an ingestion collaborator with the jurisdiction already
/// attributed. Embedded and upserted once per content revision; re-ingestion
/// replaces by `doc_id`. The query path never mutates a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalDocument {
    pub doc_id: String,
    pub jurisdiction: Jurisdiction,
    /// Free-text state or region label, e.g. "Bavaria" or "California".
    #[serde(default)]
    pub sub_jurisdiction: Option<String>,
    pub title: String,
    pub text: String,
    pub source_url: String,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    pub doc_type: DocumentType,
    #[serde(default)]
    pub court_level: Option<CourtLevel>,
    /// Language code of the document body, e.g. "de".
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Populated lazily by the ingestion path. Never part of the wire
    /// contract.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// A user-supplied document injected directly into the prompt context.
/// Never indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdHocDocument {
    pub title: String,
    pub text: String,
}

/// Per-request query parameters from the UI collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySession {
    pub question: String,
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub sub_jurisdiction: Option<String>,
    pub role: UserRole,
    pub language: Language,
    /// Empty means all document types.
    #[serde(default)]
    pub doc_types: Vec<DocumentType>,
    /// Empty means all court levels.
    #[serde(default)]
    pub court_levels: Vec<CourtLevel>,
    #[serde(default)]
    pub use_public_knowledge: bool,
    #[serde(default)]
    pub extra_documents: Vec<AdHocDocument>,
}

impl QuerySession {
    pub fn new(
        question: impl Into<String>,
        jurisdiction: Jurisdiction,
        role: UserRole,
        language: Language,
    ) -> Self {
        Self {
            question: question.into(),
            jurisdiction,
            sub_jurisdiction: None,
            role,
            language,
            doc_types: Vec::new(),
            court_levels: Vec::new(),
            use_public_knowledge: false,
            extra_documents: Vec::new(),
        }
    }
}

/// The result handed back to the caller. Consumed once, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Never empty. Failure modes degrade into a displayable string.
    pub answer: String,
    /// Sources actually retrieved. Empty exactly when grounding did not
    /// occur; there is no separate boolean flag.
    pub sources: Vec<LegalDocument>,
    #[serde(default)]
    pub mismatch_warning: Option<String>,
}

impl QueryResponse {
    /// Whether the answer was grounded in retrieved sources.
    pub fn grounded(&self) -> bool {
        !self.sources.is_empty()
    }
}
