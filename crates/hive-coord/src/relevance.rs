//! Keyword-overlap relevance ranking.
//!
//! No index, no model, no state: candidates are scored by the fraction of
//! query keywords contained in their searchable text. Containment is
//! substring, not token equality, so the keyword `migrat` matches inside
//! `migration`. Same inputs always produce the same ranking; ties keep
//! the original candidate order (the sort is stable).

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use hive_core::text::clip;

/// Common English function words plus domain-generic verbs that carry no
/// signal in a "what am I working on" query.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "will", "would", "could", "should", "may", "might", "shall", "can",
        "must", "need", "dare", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as",
        "into", "through", "during", "before", "after", "above", "below", "between", "out", "off",
        "over", "under", "again", "further", "then", "once", "and", "but", "or", "nor", "not",
        "so", "yet", "both", "either", "neither", "each", "every", "all", "any", "few", "more",
        "most", "other", "some", "such", "no", "only", "own", "same", "than", "too", "very",
        "just", "because", "if", "when", "where", "how", "what", "which", "who", "whom", "this",
        "that", "these", "those", "it", "its", "use", "using", "used", "get", "set", "add", "new",
        "make",
    ]
    .into_iter()
    .collect()
});

/// Maximum bytes of candidate text carried into a [`RelevantEntry`].
const ENTRY_CLIP: usize = 300;

/// Extract significant keywords: lowercase, keep letters/digits/hyphen,
/// split on whitespace, drop short tokens and stop words.
#[must_use]
pub fn keywords(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalized
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_owned)
        .collect()
}

/// Fraction of `query_keywords` contained (as substrings) in `target`.
fn score(query_keywords: &[String], target: &str) -> f64 {
    if query_keywords.is_empty() {
        return 0.0;
    }
    let target = target.to_lowercase();
    let matches = query_keywords.iter().filter(|kw| target.contains(kw.as_str())).count();
    matches as f64 / query_keywords.len() as f64
}

/// One candidate to rank: free text plus whatever title/tags travel with it.
#[derive(Clone, Debug, Default)]
pub struct Candidate {
    /// Main text.
    pub content: String,
    /// Optional title, concatenated into the searchable text.
    pub title: Option<String>,
    /// Tags, concatenated into the searchable text.
    pub tags: Vec<String>,
    /// Attribution carried through to the result.
    pub source: String,
}

/// A ranked match.
#[derive(Clone, Debug, PartialEq)]
pub struct RelevantEntry {
    /// Clipped candidate content.
    pub text: String,
    /// Where the candidate came from.
    pub source: String,
    /// Match fraction in `[0, 1]`.
    pub score: f64,
}

/// Knobs for [`rank`].
#[derive(Clone, Copy, Debug)]
pub struct RankOptions {
    /// Keep at most this many results.
    pub top_n: usize,
    /// Drop candidates scoring below this fraction.
    pub threshold: f64,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_n: 3,
            threshold: 0.25,
        }
    }
}

/// Rank `candidates` against `query`.
///
/// A query yielding zero keywords returns an empty result set: no ranking
/// is possible.
#[must_use]
pub fn rank(query: &str, candidates: &[Candidate], opts: &RankOptions) -> Vec<RelevantEntry> {
    let query_keywords = keywords(query);
    if query_keywords.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<RelevantEntry> = candidates
        .iter()
        .filter_map(|c| {
            let searchable = format!(
                "{} {} {}",
                c.title.as_deref().unwrap_or(""),
                c.content,
                c.tags.join(" ")
            );
            let s = score(&query_keywords, &searchable);
            (s >= opts.threshold).then(|| RelevantEntry {
                text: clip(&c.content, ENTRY_CLIP).to_owned(),
                source: c.source.clone(),
                score: s,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(opts.top_n);
    scored
}

/// Derive a relevance query from a checklist: the not-yet-completed
/// milestones joined with spaces. "What am I missing" becomes the query.
#[must_use]
pub fn milestones_to_query(milestones: &[String], progress: &HashMap<String, bool>) -> String {
    milestones
        .iter()
        .filter(|m| !progress.get(m.as_str()).copied().unwrap_or(false))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
