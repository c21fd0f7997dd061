//! The query pipeline.
//!
//! Control flow per request: mismatch detection (advisory) → retrieval
//! (embed + filtered vector search) → prompt composition → synthesis →
//! self-critique. Retrieval failures of any kind switch the request into
//! degraded mode: a short ungrounded prompt, no verification pass, and an
//! empty source list as the signal that grounding did not occur.
//!
//! The query path never returns an error to the caller. Every failure mode
//! ends in a displayable, clearly-labeled answer.

use std::sync::Arc;

use tracing::{info, warn};

use lexbridge_ai::{
    AiError, RemoteEmbedder, RemoteGenerator, TextEmbedder, TextGenerator, Verdict, parse_verdict,
    prompts,
};
use lexbridge_core::{EngineConfig, LegalDocument, QueryResponse, QuerySession, detector};
use lexbridge_store::{SearchFilter, VectorIndex};

/// The retrieval-and-grounding engine.
///
/// Stateless between requests apart from the vector index's write-once
/// readiness flag; concurrent queries need no coordination.
pub struct LegalEngine {
    pub(crate) config: EngineConfig,
    pub(crate) embedder: Arc<dyn TextEmbedder>,
    generator: Arc<dyn TextGenerator>,
    pub(crate) index: VectorIndex,
}

impl LegalEngine {
    /// Construct the engine with remote adapters from the configuration.
    pub async fn open(config: EngineConfig) -> Self {
        let embedder: Arc<dyn TextEmbedder> = Arc::new(RemoteEmbedder::new(
            &config.embedding,
            config.embedding_dim,
            config.request_timeout,
        ));
        let generator: Arc<dyn TextGenerator> =
            Arc::new(RemoteGenerator::new(&config.generation, config.request_timeout));
        let index = VectorIndex::open(
            &config.index_path,
            &config.collection,
            config.embedding_dim,
        )
        .await;
        Self::with_adapters(config, embedder, generator, index)
    }

    /// Construct the engine from explicit adapters. Used by tests to swap
    /// the remote services for mocks.
    pub fn with_adapters(
        config: EngineConfig,
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
        index: VectorIndex,
    ) -> Self {
        Self {
            config,
            embedder,
            generator,
            index,
        }
    }

    /// The vector index gateway, for status reporting.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Answer one query session.
    pub async fn answer(&self, session: &QuerySession) -> QueryResponse {
        let mismatch_warning = detector::mismatch_warning(&session.question, session.jurisdiction);
        if mismatch_warning.is_some() {
            info!(
                jurisdiction = %session.jurisdiction,
                "question vocabulary suggests a different jurisdiction"
            );
        }

        let sources = self.retrieve(session).await;
        if sources.is_empty() {
            return self.answer_degraded(session, mismatch_warning).await;
        }

        let context = prompts::format_context(&sources, &session.extra_documents);
        let bridge = prompts::compose_bridge(
            session.jurisdiction,
            session.role,
            session.language,
            session.use_public_knowledge,
        );
        let grounding = prompts::compose_grounding(
            session.jurisdiction,
            session.language,
            session.use_public_knowledge,
            &context,
            &session.question,
        );

        let answer = match self.generator.generate(&bridge, &grounding).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "answer synthesis failed");
                // Nothing meaningful to verify; hand back the inline error.
                return QueryResponse {
                    answer: unavailable_answer(&e),
                    sources,
                    mismatch_warning,
                };
            }
        };

        let answer = self.verify(&context, answer).await;
        QueryResponse {
            answer,
            sources,
            mismatch_warning,
        }
    }

    /// Embed the question and run the jurisdiction-scoped search.
    ///
    /// Any failure yields an empty list, which the caller reads as "answer
    /// without grounding".
    async fn retrieve(&self, session: &QuerySession) -> Vec<LegalDocument> {
        if !self.index.is_available() {
            warn!("vector index unavailable, skipping retrieval");
            return Vec::new();
        }

        let query_vector = match self.embedder.embed(&session.question).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, skipping retrieval");
                return Vec::new();
            }
        };

        let filter = SearchFilter {
            jurisdiction: session.jurisdiction,
            sub_jurisdiction: session.sub_jurisdiction.as_deref(),
            doc_types: &session.doc_types,
            court_levels: &session.court_levels,
        };
        self.index
            .search(&query_vector, &filter, self.config.search_limit)
            .await
    }

    /// Second model pass: check the answer against the same context and
    /// annotate it when an unsupported claim is flagged. The answer itself
    /// is kept either way; the warning is visible rather than silently
    /// corrected.
    ///
    /// Runs under the request timeout so a stuck verification cannot hold
    /// the already-computed answer hostage.
    async fn verify(&self, context: &str, answer: String) -> String {
        let user = prompts::compose_verifier(context, &answer);
        let call = self.generator.generate(prompts::VERIFIER_SYSTEM, &user);

        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(Ok(reply)) => match parse_verdict(&reply) {
                Verdict::Verified => answer,
                Verdict::Hallucination { claim } => {
                    info!(claim = %claim, "self-critique flagged an unsupported claim");
                    format!(
                        "{answer}\n\n[System warning] The following claim could not be \
                         verified against the cited sources: {claim}"
                    )
                }
            },
            Ok(Err(e)) => {
                warn!(error = %e, "verification call failed, returning unverified answer");
                answer
            }
            Err(_) => {
                warn!("verification timed out, returning unverified answer");
                answer
            }
        }
    }

    /// Ungrounded fallback: short prompt, no sources, no verification.
    async fn answer_degraded(
        &self,
        session: &QuerySession,
        mismatch_warning: Option<String>,
    ) -> QueryResponse {
        info!("answering in degraded mode without grounding context");
        let system =
            prompts::compose_degraded(session.jurisdiction, session.role, session.language);
        let answer = match self.generator.generate(&system, &session.question).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "degraded synthesis failed");
                unavailable_answer(&e)
            }
        };
        QueryResponse {
            answer,
            sources: Vec::new(),
            mismatch_warning,
        }
    }
}

/// Displayable stand-in answer for a failed generation call.
fn unavailable_answer(e: &AiError) -> String {
    format!("The answer service is currently unavailable ({e}). Please try again in a moment.")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use lexbridge_ai::prompts;
    use lexbridge_core::{Jurisdiction, Language, QuerySession, UserRole};

    use crate::testutil::{MockEmbedder, MockGenerator, doc, engine_with, session};

    #[tokio::test]
    async fn empty_index_degrades_to_ungrounded_answer() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::with_replies(&["General answer."]));
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        let resp = engine
            .answer(&session("What is the deposit cap?", Jurisdiction::De))
            .await;

        assert!(resp.sources.is_empty());
        assert_eq!(resp.answer, "General answer.");
        // Only the degraded synthesis call; the verifier is skipped.
        assert_eq!(generator.call_count(), 1);
        let (system, user) = generator.call(0);
        assert!(system.contains(prompts::degraded_disclaimer(Language::En)));
        assert_eq!(user, "What is the deposit cap?");
    }

    #[tokio::test]
    async fn broken_backend_still_answers() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-directory");
        std::fs::write(&blocker, b"plain file").unwrap();

        let generator = Arc::new(MockGenerator::with_replies(&["Ungrounded answer."]));
        let engine = engine_with(
            &blocker.join("db"),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        let resp = engine
            .answer(&session("What is the deposit cap?", Jurisdiction::De))
            .await;

        assert!(resp.sources.is_empty());
        assert_eq!(resp.answer, "Ungrounded answer.");
    }

    #[tokio::test]
    async fn grounded_query_returns_sources_and_runs_verifier() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::with_replies(&[
            "The cap is three months' rent [Source 1].",
            "VERIFIED",
        ]));
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        engine
            .ingest(vec![
                doc("de-1", Jurisdiction::De, "Deposit cap statute"),
                doc("de-2", Jurisdiction::De, "Notice period statute"),
            ])
            .await
            .unwrap();

        let resp = engine
            .answer(&session("How high may the deposit be?", Jurisdiction::De))
            .await;

        assert!(!resp.sources.is_empty());
        assert_eq!(resp.answer, "The cap is three months' rent [Source 1].");
        // Synthesis plus verification.
        assert_eq!(generator.call_count(), 2);
        let (system, user) = generator.call(1);
        assert_eq!(system, prompts::VERIFIER_SYSTEM);
        assert!(user.contains("Deposit cap statute"));
    }

    #[tokio::test]
    async fn flagged_claim_is_annotated_not_discarded() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::with_replies(&[
            "The cap is five months' rent [Source 1].",
            "HALLUCINATION DETECTED: The cap is five months' rent.",
        ]));
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        engine
            .ingest(vec![doc("de-1", Jurisdiction::De, "Deposit cap statute")])
            .await
            .unwrap();

        let resp = engine
            .answer(&session("How high may the deposit be?", Jurisdiction::De))
            .await;

        assert!(resp.answer.starts_with("The cap is five months' rent [Source 1]."));
        assert!(resp.answer.contains("[System warning]"));
        assert!(resp.answer.contains("The cap is five months' rent."));
    }

    #[tokio::test]
    async fn synthesis_failure_yields_displayable_answer() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::failing());
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        engine
            .ingest(vec![doc("de-1", Jurisdiction::De, "Deposit cap statute")])
            .await
            .unwrap();

        let resp = engine
            .answer(&session("How high may the deposit be?", Jurisdiction::De))
            .await;

        assert!(!resp.answer.is_empty());
        assert!(resp.answer.contains("unavailable"));
        // Sources were retrieved even though synthesis failed.
        assert!(!resp.sources.is_empty());
        // The verifier is not invoked after a failed synthesis.
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn embedding_failure_degrades() {
        let tmp = TempDir::new().unwrap();

        // Seed the index with a working embedder first.
        let seeder = Arc::new(MockGenerator::default());
        let engine = engine_with(tmp.path(), MockEmbedder { fail: false }, seeder).await;
        engine
            .ingest(vec![doc("de-1", Jurisdiction::De, "Deposit cap statute")])
            .await
            .unwrap();
        drop(engine);

        let generator = Arc::new(MockGenerator::with_replies(&["Ungrounded answer."]));
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: true },
            Arc::clone(&generator),
        )
        .await;

        let resp = engine
            .answer(&session("How high may the deposit be?", Jurisdiction::De))
            .await;

        assert!(resp.sources.is_empty());
        assert_eq!(resp.answer, "Ungrounded answer.");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn mismatch_warning_is_advisory() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::default());
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        // German vocabulary against the US index warns but still answers.
        let resp = engine
            .answer(&session("Wie hoch darf die Kaution sein?", Jurisdiction::Us))
            .await;
        assert!(resp.mismatch_warning.is_some());
        assert!(!resp.answer.is_empty());

        // The same question against the German index is clean.
        let resp = engine
            .answer(&session("Wie hoch darf die Kaution sein?", Jurisdiction::De))
            .await;
        assert!(resp.mismatch_warning.is_none());
    }

    #[tokio::test]
    async fn retrieval_never_crosses_jurisdictions() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::default());
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;

        engine
            .ingest(vec![
                doc("de-1", Jurisdiction::De, "Security deposit rules"),
                doc("de-2", Jurisdiction::De, "Deposit handling"),
                doc("us-1", Jurisdiction::Us, "Security deposit rules"),
                doc("us-2", Jurisdiction::Us, "Deposit handling"),
            ])
            .await
            .unwrap();

        let resp = engine
            .answer(&session("security deposit rules", Jurisdiction::De))
            .await;
        assert!(!resp.sources.is_empty());
        for source in &resp.sources {
            assert_eq!(source.jurisdiction, Jurisdiction::De);
        }
    }

    #[tokio::test]
    async fn slow_verification_is_cancelled() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator {
            delay: Some(Duration::from_millis(200)),
            ..MockGenerator::with_replies(&[
                "The cap is three months' rent [Source 1].",
                "HALLUCINATION DETECTED: never seen",
            ])
        });
        let mut engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;
        engine
            .ingest(vec![doc("de-1", Jurisdiction::De, "Deposit cap statute")])
            .await
            .unwrap();

        // Tighten the timeout after ingest so only verification is affected.
        engine.config.request_timeout = Duration::from_millis(50);

        let resp = engine
            .answer(&session("How high may the deposit be?", Jurisdiction::De))
            .await;

        // The synthesized answer survives; the late verdict is dropped.
        assert_eq!(resp.answer, "The cap is three months' rent [Source 1].");
        assert!(!resp.answer.contains("[System warning]"));
    }

    #[tokio::test]
    async fn adhoc_documents_join_the_context() {
        let tmp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::with_replies(&["Answer.", "VERIFIED"]));
        let engine = engine_with(
            tmp.path(),
            MockEmbedder { fail: false },
            Arc::clone(&generator),
        )
        .await;
        engine
            .ingest(vec![doc("es-1", Jurisdiction::Es, "LAU art. 36")])
            .await
            .unwrap();

        let mut session = QuerySession::new(
            "Is a two-month deposit clause valid?",
            Jurisdiction::Es,
            UserRole::Tenant,
            Language::En,
        );
        session.extra_documents.push(lexbridge_core::AdHocDocument {
            title: "My lease".into(),
            text: "Clause 4 sets a two-month deposit.".into(),
        });

        let resp = engine.answer(&session).await;
        assert_eq!(resp.sources.len(), 1, "ad-hoc documents are not sources");
        let (_, user) = generator.call(0);
        assert!(user.contains("My lease (user-supplied)"));
        assert!(user.contains("LAU art. 36"));
    }
}
