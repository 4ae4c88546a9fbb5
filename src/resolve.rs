//! Document reference resolution.
//!
//! A citation names its document loosely: by id, by display name, or by a
//! fragment such as a file name. Resolution runs two explicit phases:
//!
//! 1. exact match against ids, then against display names
//! 2. normalized containment: NFKC, keep alphanumerics, lowercase, and accept
//!    the first candidate where either string contains the other
//!
//! Phase 1 always wins, since one name can be a substring of another.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::model::{DocumentEntry, Segment};

/// Outcome of resolving a document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "id", rename_all = "lowercase")]
pub enum Resolution {
    /// Matched an id or display name verbatim
    Exact(String),
    /// Matched after normalization
    Fuzzy(String),
    /// No candidate matched
    Unresolved,
}

impl Resolution {
    /// Resolved document id, if any.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Resolution::Exact(id) | Resolution::Fuzzy(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    /// Consume into the resolved id.
    pub fn into_document_id(self) -> Option<String> {
        match self {
            Resolution::Exact(id) | Resolution::Fuzzy(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    /// Check if a document was found.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Lower-cased alphanumeric skeleton of a name.
pub fn normalize_name(name: &str) -> String {
    name.nfkc()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Resolves document references against the documents in scope.
#[derive(Debug, Clone, Default)]
pub struct DocumentResolver {
    candidates: Vec<DocumentEntry>,
    normalized: Vec<String>,
}

impl DocumentResolver {
    /// Create a resolver over a snapshot of visible documents.
    ///
    /// Candidate order is significant: the first fuzzy match wins.
    pub fn new(candidates: Vec<DocumentEntry>) -> Self {
        let normalized = candidates
            .iter()
            .map(|c| normalize_name(&c.display_name))
            .collect();
        Self {
            candidates,
            normalized,
        }
    }

    /// Phase 1: verbatim id match, then verbatim display-name match.
    pub fn exact_match(&self, reference: &str) -> Option<&DocumentEntry> {
        let reference = reference.trim();
        self.candidates
            .iter()
            .find(|c| c.id == reference)
            .or_else(|| self.candidates.iter().find(|c| c.display_name == reference))
    }

    /// Phase 2: containment between normalized reference and display names.
    ///
    /// A reference that normalizes to the empty string matches nothing.
    pub fn fuzzy_match(&self, reference: &str) -> Option<&DocumentEntry> {
        let needle = normalize_name(reference);
        if needle.is_empty() {
            return None;
        }

        self.candidates
            .iter()
            .zip(&self.normalized)
            .find(|(_, name)| {
                !name.is_empty() && (name.contains(needle.as_str()) || needle.contains(name.as_str()))
            })
            .map(|(candidate, _)| candidate)
    }

    /// Resolve a reference. Never fails; a miss is [`Resolution::Unresolved`].
    pub fn resolve(&self, reference: &str) -> Resolution {
        if let Some(entry) = self.exact_match(reference) {
            return Resolution::Exact(entry.id.clone());
        }
        if let Some(entry) = self.fuzzy_match(reference) {
            log::debug!("fuzzy-resolved '{}' to '{}'", reference, entry.id);
            return Resolution::Fuzzy(entry.id.clone());
        }
        log::debug!("unresolved document reference '{}'", reference);
        Resolution::Unresolved
    }

    /// Fill in `document_id` for every citation that carries a reference.
    pub fn resolve_segments(&self, segments: &mut [Segment]) {
        for segment in segments.iter_mut() {
            if let Segment::Citation(citation) = segment {
                citation.document_id = citation
                    .doc_ref
                    .as_deref()
                    .and_then(|r| self.resolve(r).into_document_id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::CitationParser;
    use crate::model::SpanRef;

    fn resolver() -> DocumentResolver {
        DocumentResolver::new(vec![
            DocumentEntry::new("x", "Acme"),
            DocumentEntry::new("y", "Acme Corp"),
        ])
    }

    #[test]
    fn test_exact_match_wins_over_fuzzy() {
        assert_eq!(resolver().resolve("Acme"), Resolution::Exact("x".to_string()));
    }

    #[test]
    fn test_exact_id_before_display_name() {
        let resolver = DocumentResolver::new(vec![
            DocumentEntry::new("a", "b"),
            DocumentEntry::new("b", "other"),
        ]);
        assert_eq!(resolver.resolve("b"), Resolution::Exact("b".to_string()));
    }

    #[test]
    fn test_fuzzy_fallback() {
        let resolver = DocumentResolver::new(vec![DocumentEntry::new("doc-7", "Acme Corp")]);
        assert_eq!(
            resolver.resolve("acme-corp-2023.pdf"),
            Resolution::Fuzzy("doc-7".to_string())
        );
    }

    #[test]
    fn test_fuzzy_takes_first_candidate() {
        // "acme" is contained in both skeletons
        assert_eq!(resolver().resolve("ACME!"), Resolution::Fuzzy("x".to_string()));
    }

    #[test]
    fn test_fuzzy_handles_compatibility_forms() {
        let resolver = DocumentResolver::new(vec![DocumentEntry::new("q", "Quarterly Report")]);
        assert_eq!(
            resolver.resolve("ＱＵＡＲＴＥＲＬＹ report"),
            Resolution::Fuzzy("q".to_string())
        );
    }

    #[test]
    fn test_unresolved() {
        assert_eq!(resolver().resolve("Globex"), Resolution::Unresolved);
        assert_eq!(resolver().resolve("---"), Resolution::Unresolved);
        assert_eq!(resolver().resolve(""), Resolution::Unresolved);
        assert!(DocumentResolver::default().resolve("Acme").document_id().is_none());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Acme-Corp 2023.PDF"), "acmecorp2023pdf");
        assert_eq!(normalize_name("ﬁnal"), "final");
    }

    #[test]
    fn test_resolve_segments() {
        let list = vec![SpanRef::new("Acme Corp", 1, 0, 4)];
        let mut segments = CitationParser::new()
            .parse("[CITATION:acme,1,0,5] [1] [2] [CITATION:nobody,1,0,1]", Some(&list));
        resolver().resolve_segments(&mut segments);

        let ids: Vec<Option<&str>> = segments
            .iter()
            .filter_map(|s| s.as_citation())
            .map(|c| c.document_id.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("x"), Some("y"), None, None]);
    }
}
