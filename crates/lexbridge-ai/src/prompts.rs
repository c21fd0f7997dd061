//! Prompt composition.
//!
//! Everything here is pure string composition, deterministic in its
//! inputs. The "cultural bridge" system prompt adapts the instruction to
//! the target jurisdiction, the user's role, and the response language,
//! appending pre-authored term-equivalence blocks when the language
//! indicates the reader comes from a different legal tradition than the
//! jurisdiction they are asking about. The grounding prompt is the stricter
//! instruction wrapped around the retrieved context for the actual
//! answer-generation call.

use lexbridge_core::{AdHocDocument, Jurisdiction, Language, LegalDocument, UserRole};

/// Literal marker for a clean verification verdict.
pub const VERIFIED_MARKER: &str = "VERIFIED";
/// Literal marker prefix for a detected unsupported claim.
pub const HALLUCINATION_MARKER: &str = "HALLUCINATION DETECTED";

/// Hedge phrases the generation model must not produce. The product gives
/// a direct, specific answer or the fixed no-information sentence; generic
/// deflection defeats both.
pub const BANNED_PHRASES: &[&str] = &[
    "consult a professional",
    "seek legal advice",
    "I am not a lawyer",
    "this is not legal advice",
    "it depends on your specific situation",
];

/// System prompt for the answer-generation call.
///
/// Deterministic in its four inputs; identical inputs produce byte-identical
/// text.
pub fn compose_bridge(
    jurisdiction: Jurisdiction,
    role: UserRole,
    language: Language,
    public_knowledge: bool,
) -> String {
    let mut prompt = format!(
        "You are a legal assistant answering questions about the law of {} ({}). \
         Respond in {}. Use the correct legal terminology of the jurisdiction; \
         keep original-language statute names and cite them as given.",
        jurisdiction.display_name(),
        jurisdiction.as_str(),
        language.display_name(),
    );

    if let Some(block) = bridge_block(jurisdiction, language) {
        prompt.push_str("\n\n");
        prompt.push_str(block);
    }

    prompt.push_str("\n\n");
    prompt.push_str(role_block(role));

    if public_knowledge {
        prompt.push_str("\n\n");
        prompt.push_str(PUBLIC_KNOWLEDGE_BLOCK);
    }

    prompt
}

/// Pre-authored term-equivalence and caveat block for one
/// (jurisdiction, language) pair.
///
/// A finite lookup table, not a generated translation. Native pairs need no
/// bridging, and pairs without an authored block get nothing; comparisons
/// are never invented.
fn bridge_block(jurisdiction: Jurisdiction, language: Language) -> Option<&'static str> {
    match (jurisdiction, language) {
        // Native combinations.
        (Jurisdiction::De, Language::De) => None,
        (Jurisdiction::Us, Language::En) => None,
        (Jurisdiction::Es, Language::Es) => None,

        (Jurisdiction::De, Language::En) => Some(
            "Terminology bridge for English-speaking readers of German law:\n\
             - \"Kaution\" is roughly a security deposit, but it is capped at three months' \
             net cold rent (Kaltmiete) and must be held separately from the landlord's assets.\n\
             - The \"Mietspiegel\" is an official local reference rent index; there is no \
             direct equivalent in common-law systems.\n\
             - \"Kündigungsfrist\" is the statutory notice period; ordinary termination by \
             the landlord requires a legally recognised reason such as \"Eigenbedarf\" \
             (personal use). At-will terminations do not exist.\n\
             - \"Nebenkosten\" are operating costs billed on top of the cold rent, settled \
             annually against actual usage.",
        ),
        (Jurisdiction::De, Language::Es) => Some(
            "Puente terminológico para lectores hispanohablantes sobre derecho alemán:\n\
             - La \"Kaution\" equivale a la fianza, pero su tope son tres mensualidades de \
             renta fría (Kaltmiete), no una como en la LAU española.\n\
             - El \"Mietvertrag\" es el contrato de arrendamiento; los contratos indefinidos \
             son la norma, a diferencia del régimen español de prórrogas.\n\
             - El \"Grundbuch\" cumple la función del Registro de la Propiedad; la \
             \"Grunderwerbsteuer\" es el impuesto de transmisiones (similar al ITP).",
        ),
        (Jurisdiction::Es, Language::En) => Some(
            "Terminology bridge for English-speaking readers of Spanish law:\n\
             - The \"fianza\" is the statutory deposit: one month's rent for housing, \
             lodged with the regional deposit agency, not held by the landlord.\n\
             - A \"nota simple\" is a land-registry extract from the Registro de la \
             Propiedad; obtain one before any purchase.\n\
             - The \"comunidad de propietarios\" resembles an HOA but is a statutory body \
             under the Ley de Propiedad Horizontal.\n\
             - \"IBI\" is the annual municipal property tax.",
        ),
        (Jurisdiction::Es, Language::De) => Some(
            "Terminologie-Brücke für deutschsprachige Leser zum spanischen Recht:\n\
             - Die \"fianza\" entspricht der Kaution, beträgt aber bei Wohnraum eine \
             Monatsmiete (LAU) statt bis zu drei Kaltmieten und wird bei der regionalen \
             Hinterlegungsstelle hinterlegt.\n\
             - Die \"nota simple\" ist das Gegenstück zum Grundbuchauszug und kommt aus \
             dem Registro de la Propiedad.\n\
             - Die \"comunidad de propietarios\" entspricht der WEG-Gemeinschaft.\n\
             - \"ITP\" ist die regionale Grunderwerbsteuer (je nach Region etwa 6 bis 10 \
             Prozent).",
        ),
        (Jurisdiction::Us, Language::De) => Some(
            "Terminologie-Brücke für deutschsprachige Leser zum US-Recht:\n\
             - Das \"security deposit\" entspricht der Kaution; Obergrenzen sind \
             einzelstaatlich geregelt und liegen oft bei ein bis zwei Monatsmieten.\n\
             - Einen Mietspiegel gibt es nicht; Mieten sind grundsätzlich Marktpreise, \
             \"rent control\" existiert nur in wenigen Städten.\n\
             - \"Eviction\" ist ein gerichtliches Räumungsverfahren und läuft erheblich \
             schneller ab als eine Räumungsklage in Deutschland.\n\
             - Eine \"HOA\" ähnelt der WEG-Gemeinschaft, beruht aber auf privaten \
             Satzungen (covenants), nicht auf einem Gesetz.",
        ),
        (Jurisdiction::Us, Language::Es) => Some(
            "Puente terminológico para lectores hispanohablantes sobre derecho \
             estadounidense:\n\
             - El \"security deposit\" equivale a la fianza; los límites dependen de cada \
             estado y no existe una agencia de depósito como en España.\n\
             - No hay un registro unificado tipo nota simple; la titularidad se verifica \
             mediante \"title search\" y se asegura con \"title insurance\".\n\
             - La \"HOA\" se parece a la comunidad de propietarios, pero se rige por \
             estatutos privados, no por una ley estatal.",
        ),
    }
}

/// Role-specific emphasis appended to the bridge prompt.
fn role_block(role: UserRole) -> &'static str {
    match role {
        UserRole::Investor => {
            "The reader is an investor. Emphasise acquisition procedure, transaction \
             taxes, holding costs, and the legal risks that affect returns."
        }
        UserRole::Landlord => {
            "The reader is a landlord. Emphasise the landlord's obligations, deposit \
             handling rules, permissible rent adjustments, and lawful termination \
             grounds and procedure."
        }
        UserRole::Tenant => {
            "The reader is a tenant. Emphasise tenant protections, deposit recovery, \
             notice periods, and which clauses or demands are unenforceable."
        }
        UserRole::Owner => {
            "The reader is a property owner. Emphasise ownership duties, owners' \
             community obligations, recurring taxes, and liability toward third \
             parties."
        }
        UserRole::Manager => {
            "The reader is a property manager. Emphasise operational compliance, \
             duties delegated from the owner, record-keeping, and the boundaries of \
             the manager's authority."
        }
        UserRole::Lawyer => {
            "The reader is a lawyer. Use precise statutory references, name the \
             governing provisions and leading cases, and note procedural posture \
             where relevant."
        }
    }
}

const PUBLIC_KNOWLEDGE_BLOCK: &str =
    "You may additionally draw on well-established public legal knowledge. Mark every \
     such statement with [General knowledge] instead of a source citation. The supplied \
     sources always take precedence where they conflict.";

/// Fixed per-language sentence emitted verbatim when the context cannot
/// answer the question.
pub fn no_information_sentence(language: Language) -> &'static str {
    match language {
        Language::En => {
            "The available sources do not contain enough information to answer this question."
        }
        Language::De => {
            "Die verfügbaren Quellen enthalten nicht genügend Informationen, um diese Frage zu beantworten."
        }
        Language::Es => {
            "Las fuentes disponibles no contienen información suficiente para responder a esta pregunta."
        }
    }
}

/// Fixed per-language disclaimer opening every ungrounded answer.
pub fn degraded_disclaimer(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Note: this answer is based on general knowledge, not on verified legal sources."
        }
        Language::De => {
            "Hinweis: Diese Antwort beruht auf allgemeinem Wissen, nicht auf geprüften Rechtsquellen."
        }
        Language::Es => {
            "Aviso: esta respuesta se basa en conocimientos generales, no en fuentes legales verificadas."
        }
    }
}

/// The strict user message for the answer-generation call: grounding rules
/// in order of precedence, then the numbered context, then the question.
pub fn compose_grounding(
    jurisdiction: Jurisdiction,
    language: Language,
    public_knowledge: bool,
    context: &str,
    question: &str,
) -> String {
    let mut rules = String::from(
        "Answer the question using only the numbered sources in the context block below.",
    );
    if public_knowledge {
        rules.push_str(
            " Statements from public knowledge are allowed only under the \
             [General knowledge] marking rule given above.",
        );
    }
    rules.push_str(&format!(
        "\nIf the context does not answer the question, reply with exactly this sentence \
         and nothing else: \"{}\"\n\
         Every factual claim must be followed by a bracketed citation naming the source \
         it comes from, for example [Source 2].\n\
         If the sources belong to a jurisdiction other than {}, reply: \"{}\" instead of \
         answering.\n\
         Never use filler phrases such as {}. Give the direct, specific answer.",
        no_information_sentence(language),
        jurisdiction.display_name(),
        jurisdiction_mismatch_sentence(jurisdiction),
        banned_phrase_list(),
    ));

    format!(
        "{rules}\n\nContext:\n{context}\n\nQuestion ({}, answer in {}):\n{question}",
        jurisdiction.display_name(),
        language.display_name(),
    )
}

/// Fixed sentence emitted when the supplied context belongs to the wrong
/// jurisdiction.
pub fn jurisdiction_mismatch_sentence(jurisdiction: Jurisdiction) -> String {
    format!(
        "The retrieved sources do not match the requested jurisdiction ({}); no grounded \
         answer can be given.",
        jurisdiction.display_name()
    )
}

fn banned_phrase_list() -> String {
    let quoted: Vec<String> = BANNED_PHRASES.iter().map(|p| format!("\"{p}\"")).collect();
    quoted.join(", ")
}

/// Short unconstrained system prompt for degraded (no-context) operation.
/// Still jurisdiction, role, and language aware.
pub fn compose_degraded(jurisdiction: Jurisdiction, role: UserRole, language: Language) -> String {
    format!(
        "You are a legal assistant. No source documents are available for this request. \
         Answer the question about the law of {} from general knowledge, in {}, for a \
         {}. Begin your reply with exactly this sentence: \"{}\" Keep the answer short \
         and state clearly when you are unsure.",
        jurisdiction.display_name(),
        language.display_name(),
        role.as_str(),
        degraded_disclaimer(language),
    )
}

/// System prompt for the self-critique call.
pub const VERIFIER_SYSTEM: &str =
    "You are a meticulous legal fact-checker. You compare an answer against the source \
     excerpts it was generated from and you flag any claim the sources do not support.";

/// User message for the self-critique call over the same context.
pub fn compose_verifier(context: &str, answer: &str) -> String {
    format!(
        "Check the answer below against the sources. If every factual claim is supported \
         by the sources, reply with exactly \"{VERIFIED_MARKER}\". If any claim is not \
         supported, reply with \"{HALLUCINATION_MARKER}: \" followed by the unsupported \
         claim, quoted from the answer.\n\nSources:\n{context}\n\nAnswer to check:\n{answer}"
    )
}

/// Render retrieved and user-supplied documents as a numbered context
/// block. Ad-hoc documents continue the numbering and are labelled as
/// user-supplied.
pub fn format_context(sources: &[LegalDocument], extra: &[AdHocDocument]) -> String {
    let mut out = String::new();
    let mut n = 0usize;

    for doc in sources {
        n += 1;
        out.push_str(&format!(
            "[Source {n}] {} ({}, {})\n{}\n\n",
            doc.title,
            doc.jurisdiction.as_str(),
            doc.doc_type.as_str(),
            doc.text,
        ));
    }
    for doc in extra {
        n += 1;
        out.push_str(&format!(
            "[Source {n}] {} (user-supplied)\n{}\n\n",
            doc.title, doc.text,
        ));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbridge_core::DocumentType;

    #[test]
    fn bridge_is_deterministic() {
        for j in Jurisdiction::ALL {
            for l in Language::ALL {
                for r in UserRole::ALL {
                    for pk in [false, true] {
                        let a = compose_bridge(j, r, l, pk);
                        let b = compose_bridge(j, r, l, pk);
                        assert_eq!(a, b, "prompt must be byte-identical for equal inputs");
                    }
                }
            }
        }
    }

    #[test]
    fn native_pairs_have_no_bridge_block() {
        let native = compose_bridge(Jurisdiction::De, UserRole::Tenant, Language::De, false);
        let foreign = compose_bridge(Jurisdiction::De, UserRole::Tenant, Language::En, false);
        assert!(!native.contains("Terminology bridge"));
        assert!(foreign.contains("Terminology bridge"));
        assert!(foreign.contains("Kaution"));
    }

    #[test]
    fn every_foreign_pair_is_authored() {
        let native = [
            (Jurisdiction::De, Language::De),
            (Jurisdiction::Us, Language::En),
            (Jurisdiction::Es, Language::Es),
        ];
        for j in Jurisdiction::ALL {
            for l in Language::ALL {
                let expected = !native.contains(&(j, l));
                assert_eq!(
                    bridge_block(j, l).is_some(),
                    expected,
                    "pair ({j}, {l}) authored state unexpected"
                );
            }
        }
    }

    #[test]
    fn role_emphasis_varies() {
        let tenant = compose_bridge(Jurisdiction::De, UserRole::Tenant, Language::De, false);
        let landlord = compose_bridge(Jurisdiction::De, UserRole::Landlord, Language::De, false);
        assert_ne!(tenant, landlord);
        assert!(tenant.contains("tenant"));
        assert!(landlord.contains("landlord"));
    }

    #[test]
    fn public_knowledge_block_is_opt_in() {
        let off = compose_bridge(Jurisdiction::Us, UserRole::Investor, Language::En, false);
        let on = compose_bridge(Jurisdiction::Us, UserRole::Investor, Language::En, true);
        assert!(!off.contains("[General knowledge]"));
        assert!(on.contains("[General knowledge]"));
    }

    #[test]
    fn grounding_prompt_carries_all_clauses() {
        let prompt = compose_grounding(
            Jurisdiction::De,
            Language::De,
            false,
            "[Source 1] BGB § 551\ntext",
            "Wie hoch darf die Kaution sein?",
        );
        assert!(prompt.contains("only the numbered sources"));
        assert!(prompt.contains(no_information_sentence(Language::De)));
        assert!(prompt.contains("[Source 2]"));
        assert!(prompt.contains("consult a professional"));
        assert!(prompt.contains("Germany"));
        assert!(prompt.contains("Wie hoch darf die Kaution sein?"));
    }

    #[test]
    fn no_information_sentences_differ_by_language() {
        let mut seen: Vec<&str> = Language::ALL
            .iter()
            .map(|&l| no_information_sentence(l))
            .collect();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn degraded_prompt_is_short_and_disclaims() {
        let degraded = compose_degraded(Jurisdiction::Es, UserRole::Owner, Language::En);
        let grounded = compose_grounding(
            Jurisdiction::Es,
            Language::En,
            false,
            "[Source 1] long context",
            "question",
        );
        assert!(degraded.contains(degraded_disclaimer(Language::En)));
        assert!(degraded.contains("Spain"));
        assert!(degraded.contains("owner"));
        assert!(degraded.len() < grounded.len());
    }

    #[test]
    fn context_numbering_spans_retrieved_and_adhoc() {
        let source = LegalDocument {
            doc_id: "x".into(),
            jurisdiction: Jurisdiction::Es,
            sub_jurisdiction: None,
            title: "LAU art. 36".into(),
            text: "La fianza será de una mensualidad.".into(),
            source_url: "https://example.com".into(),
            published_at: None,
            doc_type: DocumentType::Statute,
            court_level: None,
            language: "es".into(),
            tags: vec![],
            embedding: None,
        };
        let extra = AdHocDocument {
            title: "My lease".into(),
            text: "Clause 4 sets a two-month deposit.".into(),
        };
        let context = format_context(&[source], &[extra]);
        assert!(context.contains("[Source 1] LAU art. 36 (ES, statute)"));
        assert!(context.contains("[Source 2] My lease (user-supplied)"));
    }

    #[test]
    fn verifier_prompt_names_both_markers() {
        let prompt = compose_verifier("ctx", "answer");
        assert!(prompt.contains(VERIFIED_MARKER));
        assert!(prompt.contains(HALLUCINATION_MARKER));
        assert!(prompt.contains("ctx"));
        assert!(prompt.contains("answer"));
    }
}
