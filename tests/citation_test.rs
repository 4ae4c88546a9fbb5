//! Integration tests for citation parsing and document resolution.

use citespan::{
    parse_citations, CitationKind, CitationParser, DocumentEntry, DocumentResolver, Resolution,
    Segment, SpanLocation, SpanRef,
};
use proptest::prelude::*;

fn citations(segments: &[Segment]) -> Vec<&citespan::Citation> {
    segments.iter().filter_map(|s| s.as_citation()).collect()
}

#[test]
fn test_text_without_markers_is_unchanged() {
    let text = "Quarterly revenue rose 12% [see appendix], driven by services.";
    assert_eq!(parse_citations(text, None), vec![Segment::text(text)]);
}

#[test]
fn test_standard_numbering() {
    let segments = parse_citations("See [CITATION:A,1,0,5] and [CITATION:B,1,10,15]", None);
    let found = citations(&segments);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].display_index, 1);
    assert_eq!(found[0].doc_ref.as_deref(), Some("A"));
    assert_eq!(found[1].display_index, 2);
    assert_eq!(found[1].doc_ref.as_deref(), Some("B"));
    assert!(found[0].source_position < found[1].source_position);
}

#[test]
fn test_numbered_out_of_range_is_kept() {
    let list = vec![SpanRef::new("doc", 4, 100, 120)];
    let segments = parse_citations("[1] then [2]", Some(&list));
    let found = citations(&segments);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].location, Some(SpanLocation::new(4, 100, 120)));
    assert_eq!(found[1].display_index, 2);
    assert_eq!(found[1].location, None);
    assert_eq!(segments[1], Segment::text(" then "));
}

#[test]
fn test_grammars_do_not_short_circuit() {
    // A freeform marker before a standard one must not hide it, and vice versa
    let text = r#"Citation: "first" x [CITATION:D,2,0,4] y Citation: "last""#;
    let found = CitationParser::new().citations(text, None);

    let kinds: Vec<CitationKind> = found.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![CitationKind::Freeform, CitationKind::Standard, CitationKind::Freeform]
    );
    let numbers: Vec<u32> = found.iter().map(|c| c.display_index).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_numbered_keep_literal_number_between_shared_counter() {
    let text = "[3] a [CITATION:A,1,0,1] b [1] c [CITATION:A,1,1,2]";
    let found = CitationParser::new().citations(text, None);
    let numbers: Vec<u32> = found.iter().map(|c| c.display_index).collect();
    assert_eq!(numbers, vec![3, 1, 1, 2]);
}

#[test]
fn test_no_double_emission_inside_standard_marker() {
    let found = CitationParser::new().citations("[CITATION:A, page 2, 0, 5, note [3]] end", None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, CitationKind::Standard);
    assert_eq!(found[0].location, Some(SpanLocation::new(2, 0, 5)));
}

#[test]
fn test_prose_round_trips_around_markers() {
    let text = "Alpha [CITATION:A,1,0,5] beta [2] gamma Citation: \"q\" delta";
    let segments = parse_citations(text, None);

    let rebuilt: String = segments
        .iter()
        .map(|s| match s {
            Segment::Text { text } => text.clone(),
            Segment::Citation(c) => c.marker.clone(),
        })
        .collect();
    assert_eq!(rebuilt, text);
}

#[test]
fn test_resolver_exact_precedence() {
    let resolver = DocumentResolver::new(vec![
        DocumentEntry::new("y", "Acme Corp"),
        DocumentEntry::new("x", "Acme"),
    ]);
    assert_eq!(resolver.resolve("Acme"), Resolution::Exact("x".to_string()));
}

#[test]
fn test_resolver_fuzzy_fallback() {
    let resolver = DocumentResolver::new(vec![DocumentEntry::new("c", "Acme Corp")]);
    assert_eq!(resolver.exact_match("acme-corp-2023.pdf"), None);
    assert_eq!(
        resolver.fuzzy_match("acme-corp-2023.pdf").map(|d| d.id.as_str()),
        Some("c")
    );
    assert_eq!(
        resolver.resolve("acme-corp-2023.pdf"),
        Resolution::Fuzzy("c".to_string())
    );
}

#[test]
fn test_unresolved_citation_is_not_clickable() {
    let mut segments = parse_citations("x [CITATION:Initech,1,0,5]", None);
    DocumentResolver::new(vec![DocumentEntry::new("a", "Acme")]).resolve_segments(&mut segments);

    let citation = segments[1].as_citation().unwrap();
    assert_eq!(citation.document_id, None);
    assert!(!citation.is_clickable());
    assert!(citation.location.is_some());
}

proptest! {
    #[test]
    fn prop_marker_free_text_is_one_segment(text in "[^\\[C]*") {
        let segments = parse_citations(&text, None);
        prop_assert_eq!(segments, vec![Segment::text(text.clone())]);
    }

    #[test]
    fn prop_parse_is_idempotent_and_total(text in "\\PC{0,64}") {
        let parser = CitationParser::new();
        let first = parser.parse(&text, None);
        prop_assert_eq!(&first, &parser.parse(&text, None));

        let rebuilt: String = first
            .iter()
            .map(|s| match s {
                Segment::Text { text } => text.clone(),
                Segment::Citation(c) => c.marker.clone(),
            })
            .collect();
        prop_assert_eq!(rebuilt, text);
    }
}
