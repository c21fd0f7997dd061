//! Keyword-based jurisdiction mismatch detection.
//!
//! Flags questions whose vocabulary belongs to a jurisdiction other than
//! the selected one, e.g. a question about "Kaution" asked against the US
//! index. Matching is case-insensitive on word boundaries.
//!
//! The detector is advisory only. It never blocks retrieval and never
//! alters the search filter; it exists to catch user error, not to correct
//! it. Keyword lists can overlap in spelling across jurisdictions, so
//! false positives are possible and accepted.

use crate::types::Jurisdiction;

/// Terms characteristic of German (DE) real-estate and tenancy law.
const DE_TERMS: &[&str] = &[
    "kaution",
    "mietvertrag",
    "mietspiegel",
    "kündigung",
    "kündigungsfrist",
    "nebenkosten",
    "betriebskosten",
    "eigenbedarf",
    "mietpreisbremse",
    "schufa",
    "grundbuch",
    "grunderwerbsteuer",
    "hausverwaltung",
    "hausordnung",
    "untermiete",
    "mieterschutz",
    "wohnungsübergabe",
    "amtsgericht",
    "mietminderung",
    "bgb",
];

/// Terms characteristic of US real-estate and landlord-tenant law.
const US_TERMS: &[&str] = &[
    "security deposit",
    "eviction",
    "lease agreement",
    "landlord-tenant",
    "fair housing",
    "rent control",
    "month-to-month",
    "sublease",
    "small claims court",
    "habitability",
    "zoning",
    "escrow",
    "title insurance",
    "closing costs",
    "property tax",
    "foreclosure",
    "hoa",
    "1031 exchange",
];

/// Terms characteristic of Spanish (ES) property and rental law.
const ES_TERMS: &[&str] = &[
    "fianza",
    "arrendamiento",
    "arrendador",
    "arrendatario",
    "desahucio",
    "comunidad de propietarios",
    "nota simple",
    "registro de la propiedad",
    "catastro",
    "cédula de habitabilidad",
    "aval bancario",
    "alquiler turístico",
    "ibi",
    "itp",
    "lau",
    "okupas",
];

fn terms_for(jurisdiction: Jurisdiction) -> &'static [&'static str] {
    match jurisdiction {
        Jurisdiction::De => DE_TERMS,
        Jurisdiction::Us => US_TERMS,
        Jurisdiction::Es => ES_TERMS,
    }
}

/// Matched terms for one jurisdiction's dictionary.
#[derive(Debug, Clone)]
pub struct JurisdictionMatches {
    pub jurisdiction: Jurisdiction,
    pub terms: Vec<&'static str>,
}

/// Match the question against every jurisdiction's dictionary.
///
/// Returns one entry per known jurisdiction, in [`Jurisdiction::ALL`]
/// order, with the terms that matched (possibly empty).
pub fn scan(question: &str) -> Vec<JurisdictionMatches> {
    let lower = question.to_lowercase();
    Jurisdiction::ALL
        .iter()
        .map(|&jurisdiction| JurisdictionMatches {
            jurisdiction,
            terms: terms_for(jurisdiction)
                .iter()
                .copied()
                .filter(|term| contains_word(&lower, term))
                .collect(),
        })
        .collect()
}

/// Matches for jurisdictions other than the selected target, dropping
/// jurisdictions with no hits.
pub fn foreign_matches(question: &str, target: Jurisdiction) -> Vec<JurisdictionMatches> {
    scan(question)
        .into_iter()
        .filter(|m| m.jurisdiction != target && !m.terms.is_empty())
        .collect()
}

/// Advisory warning naming up to three foreign-jurisdiction terms found in
/// the question, or `None` when the vocabulary is consistent with the
/// target.
pub fn mismatch_warning(question: &str, target: Jurisdiction) -> Option<String> {
    let foreign = foreign_matches(question, target);
    if foreign.is_empty() {
        return None;
    }

    let names: Vec<&str> = foreign
        .iter()
        .map(|m| m.jurisdiction.display_name())
        .collect();
    let terms: Vec<String> = foreign
        .iter()
        .flat_map(|m| m.terms.iter().map(|t| format!("\"{t}\"")))
        .take(3)
        .collect();

    Some(format!(
        "The question uses terminology associated with {} law ({}), but the selected \
         jurisdiction is {}. Sources are retrieved for {} only.",
        names.join(" and "),
        terms.join(", "),
        target.display_name(),
        target.display_name(),
    ))
}

/// Case-sensitive word-boundary search of `term` (already lowercase) in
/// `haystack` (already lowercase). A boundary is any non-alphanumeric
/// character or the string edge, so multi-word terms match as phrases.
fn contains_word(haystack: &str, term: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let begin = start + pos;
        let end = begin + term.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = begin + 1;
        while !haystack.is_char_boundary(start) {
            start += 1;
        }
    }
    false
}
