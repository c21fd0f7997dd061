//! Search filter construction.
//!
//! Filters are AND-combined into a single SQL predicate for the store's
//! `only_if` clause. The jurisdiction term is not optional: every search is
//! scoped to exactly one jurisdiction, which is what keeps answers free of
//! cross-jurisdiction contamination.

use lexbridge_core::{CourtLevel, DocumentType, Jurisdiction};

/// AND-combined filter terms for one search.
#[derive(Debug, Clone)]
pub struct SearchFilter<'a> {
    pub jurisdiction: Jurisdiction,
    pub sub_jurisdiction: Option<&'a str>,
    /// Empty means all document types.
    pub doc_types: &'a [DocumentType],
    /// Empty means all court levels. Only meaningful when case law is among
    /// the requested document types.
    pub court_levels: &'a [CourtLevel],
}

impl<'a> SearchFilter<'a> {
    pub fn jurisdiction(jurisdiction: Jurisdiction) -> Self {
        Self {
            jurisdiction,
            sub_jurisdiction: None,
            doc_types: &[],
            court_levels: &[],
        }
    }

    /// Render the filter as a SQL predicate.
    pub fn to_predicate(&self) -> String {
        let mut terms = vec![format!(
            "jurisdiction = {}",
            sql_quote(self.jurisdiction.as_str())
        )];

        if let Some(sub) = self.sub_jurisdiction {
            terms.push(format!("sub_jurisdiction = {}", sql_quote(sub)));
        }

        if !self.doc_types.is_empty() {
            let values: Vec<String> = self
                .doc_types
                .iter()
                .map(|t| sql_quote(t.as_str()))
                .collect();
            terms.push(format!("doc_type IN ({})", values.join(", ")));
        }

        if !self.court_levels.is_empty() {
            let values: Vec<String> = self
                .court_levels
                .iter()
                .map(|c| sql_quote(c.as_str()))
                .collect();
            terms.push(format!("court_level IN ({})", values.join(", ")));
        }

        terms.join(" AND ")
    }
}

/// Quote a string literal for a SQL predicate, doubling embedded single
/// quotes. Sub-jurisdiction values are caller-supplied text.
pub fn sql_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jurisdiction_always_present() {
        let filter = SearchFilter::jurisdiction(Jurisdiction::De);
        assert_eq!(filter.to_predicate(), "jurisdiction = 'DE'");
    }

    #[test]
    fn all_terms_and_combined() {
        let filter = SearchFilter {
            jurisdiction: Jurisdiction::Us,
            sub_jurisdiction: Some("California"),
            doc_types: &[DocumentType::Statute, DocumentType::CaseLaw],
            court_levels: &[CourtLevel::Supreme],
        };
        assert_eq!(
            filter.to_predicate(),
            "jurisdiction = 'US' AND sub_jurisdiction = 'California' \
             AND doc_type IN ('statute', 'case_law') AND court_level IN ('supreme')"
        );
    }

    #[test]
    fn embedded_quotes_escaped() {
        assert_eq!(sql_quote("O'Fallon"), "'O''Fallon'");
        let filter = SearchFilter {
            jurisdiction: Jurisdiction::Us,
            sub_jurisdiction: Some("O'Fallon"),
            doc_types: &[],
            court_levels: &[],
        };
        assert!(filter.to_predicate().contains("'O''Fallon'"));
    }
}
