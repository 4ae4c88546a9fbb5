//! The three citation marker grammars.
//!
//! Each grammar is scanned independently over the whole text; merging and
//! numbering happen afterwards in the parser.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::model::CitationKind;

static STANDARD_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static NUMBERED_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static FREEFORM_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// `[CITATION: doc, page 3, 120, 180]`, `page` keyword optional, trailing
/// parameters ignored. Trailing parameters may hold one level of `[...]`.
fn standard_regex() -> Option<&'static Regex> {
    STANDARD_REGEX
        .get_or_init(|| {
            Regex::new(
                r"(?i)\[\s*CITATION\s*:\s*([^,\]]+?)\s*,\s*(?:page\s*)?(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,(?:[^\[\]]|\[[^\[\]]*\])*)?\]",
            )
            .ok()
        })
        .as_ref()
}

/// `[7]`
fn numbered_regex() -> Option<&'static Regex> {
    NUMBERED_REGEX
        .get_or_init(|| Regex::new(r"\[(\d+)\]").ok())
        .as_ref()
}

/// `Citation: "excerpt"`, straight or curly quotes.
fn freeform_regex() -> Option<&'static Regex> {
    FREEFORM_REGEX
        .get_or_init(|| Regex::new(r#"Citation:\s*(?:"([^"]+)"|“([^”]+)”)"#).ok())
        .as_ref()
}

/// Grammar-specific payload of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MarkerData {
    /// Location is `None` when the integers overflow, the page is 0 or
    /// `end < start`; the marker is then kept as prose.
    Standard {
        doc_ref: String,
        location: Option<(u32, usize, usize)>,
    },
    Numbered {
        number: u32,
    },
    Freeform {
        excerpt: String,
    },
}

/// One marker match: byte range in the source text plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkerMatch {
    pub start: usize,
    pub end: usize,
    pub data: MarkerData,
}

impl MarkerMatch {
    pub fn kind(&self) -> CitationKind {
        match self.data {
            MarkerData::Standard { .. } => CitationKind::Standard,
            MarkerData::Numbered { .. } => CitationKind::Numbered,
            MarkerData::Freeform { .. } => CitationKind::Freeform,
        }
    }

    pub fn overlaps(&self, other: &MarkerMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn whole(caps: &Captures<'_>) -> (usize, usize) {
    caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0))
}

pub(crate) fn scan_standard(text: &str) -> Vec<MarkerMatch> {
    let Some(regex) = standard_regex() else {
        return Vec::new();
    };

    regex
        .captures_iter(text)
        .map(|caps| {
            let (start, end) = whole(&caps);
            let doc_ref = caps
                .get(1)
                .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\''))
                .unwrap_or_default()
                .to_string();

            let page = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            let from = caps.get(3).and_then(|m| m.as_str().parse::<usize>().ok());
            let to = caps.get(4).and_then(|m| m.as_str().parse::<usize>().ok());
            let location = match (page, from, to) {
                (Some(page), Some(from), Some(to)) if page >= 1 && from <= to => {
                    Some((page, from, to))
                }
                _ => None,
            };

            MarkerMatch {
                start,
                end,
                data: MarkerData::Standard { doc_ref, location },
            }
        })
        .collect()
}

pub(crate) fn scan_numbered(text: &str) -> Vec<MarkerMatch> {
    let Some(regex) = numbered_regex() else {
        return Vec::new();
    };

    regex
        .captures_iter(text)
        .filter_map(|caps| {
            let (start, end) = whole(&caps);
            // Numbers too large for u32 are not citation markers
            let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some(MarkerMatch {
                start,
                end,
                data: MarkerData::Numbered { number },
            })
        })
        .collect()
}

pub(crate) fn scan_freeform(text: &str) -> Vec<MarkerMatch> {
    let Some(regex) = freeform_regex() else {
        return Vec::new();
    };

    regex
        .captures_iter(text)
        .filter_map(|caps| {
            let (start, end) = whole(&caps);
            let excerpt = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
            Some(MarkerMatch {
                start,
                end,
                data: MarkerData::Freeform { excerpt },
            })
        })
        .collect()
}

/// Run all three grammars and keep a non-overlapping, position-ordered set.
///
/// Standard markers claim their characters first. Remaining matches are
/// taken in order of start position (numbered before freeform on a tie),
/// skipping any that overlap a match already taken.
pub(crate) fn scan_all(text: &str) -> Vec<MarkerMatch> {
    let mut accepted = scan_standard(text);

    let mut others = scan_numbered(text);
    others.extend(scan_freeform(text));
    others.sort_by_key(|m| (m.start, m.kind() != CitationKind::Numbered));

    let mut taken: Vec<MarkerMatch> = Vec::new();
    for candidate in others {
        if accepted.iter().any(|a| a.overlaps(&candidate)) {
            continue;
        }
        if taken.last().is_some_and(|t| t.overlaps(&candidate)) {
            continue;
        }
        taken.push(candidate);
    }

    accepted.extend(taken);
    accepted.sort_by_key(|m| m.start);
    accepted
}
