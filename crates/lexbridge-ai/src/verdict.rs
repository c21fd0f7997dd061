//! Parsing of the self-critique reply.

use crate::prompts::HALLUCINATION_MARKER;

/// Outcome of the self-critique call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    /// The model flagged a claim the context does not support.
    Hallucination { claim: String },
}

/// Parse the fact-checker's reply.
///
/// Models occasionally wrap the verdict in code fences or prepend
/// commentary, so the parse is lenient: any reply carrying the literal
/// hallucination marker counts as a detection, everything else as
/// verified.
pub fn parse_verdict(reply: &str) -> Verdict {
    let text = strip_fences(reply);

    if let Some(pos) = text.find(HALLUCINATION_MARKER) {
        let claim = text[pos + HALLUCINATION_MARKER.len()..]
            .trim_start_matches([':', ' '])
            .trim()
            .to_string();
        return Verdict::Hallucination { claim };
    }
    Verdict::Verified
}

/// Remove a surrounding Markdown code fence, if present.
fn strip_fences(s: &str) -> &str {
    let t = s.trim();
    if let Some(inner) = t.strip_prefix("```") {
        let inner = inner.strip_suffix("```").unwrap_or(inner);
        let inner = inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        return inner.trim();
    }
    t
}
