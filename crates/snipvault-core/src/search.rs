//! Snippet search, ranking, and tag aggregation.
//!
//! Everything here operates on an in-memory corpus snapshot. The
//! store-facing helpers ([`search_store`], [`list_tags`]) fetch that
//! snapshot once through [`SnippetStore`] and delegate to the pure
//! functions, so the scoring logic never touches storage.
//!
//! # Scoring
//!
//! For a trimmed, non-empty query `q` and a snippet with body `content`:
//!
//! | Component | Value |
//! |-----------|-------|
//! | content hit (`q` is a case-insensitive substring of `content`) | +1000 |
//! | tag hit (some tag contains `q`, case-insensitive) | +250 |
//! | position bonus, match at char index `i` | `+max(0, 200 - i)` |
//! | length penalty, `n` chars of content | `-min(100, n / 500)` |
//!
//! Snippets with neither hit are dropped. Results are sorted by score
//! (desc), `created_at` (desc), `id` (asc), then truncated to `limit`.
//!
//! # Indexing
//!
//! All positions and lengths are counted in Unicode scalar values
//! (`char`s), never bytes, so excerpt boundaries cannot split a code point.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use anyhow::Result;
use serde::Deserialize;

use crate::models::{SearchResult, Snippet, TagCount};
use crate::store::SnippetStore;
use crate::tags::normalize_tag;

/// Result count used when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound on excerpt length, ellipses included.
pub const EXCERPT_MAX_CHARS: usize = 140;

const CONTENT_HIT_SCORE: i64 = 1000;
const TAG_HIT_SCORE: i64 = 250;
const POSITION_BONUS_WINDOW: i64 = 200;
const LENGTH_PENALTY_CHARS: usize = 500;
const LENGTH_PENALTY_CAP: i64 = 100;
const ELLIPSIS: char = '…';

/// How [`tag_counts`] groups tag strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateBy {
    /// One row per stored tag string. `"JS"` and `"js"` are separate rows
    /// sharing a slug.
    #[default]
    Raw,
    /// One row per canonical slug; `tag` is the first raw spelling seen.
    Slug,
}

impl FromStr for AggregateBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Self::Raw),
            "slug" => Ok(Self::Slug),
            other => anyhow::bail!("invalid tag aggregation '{}': use raw or slug", other),
        }
    }
}

/// Locate `needle` in `haystack`, ignoring case.
///
/// Returns the char index in `haystack` where the match starts. Case
/// folding is per char, so characters whose lowercase form expands
/// (e.g. `İ`) still map back to a single source position.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Some(0);
    }

    // (source char index, folded char)
    let folded: Vec<(usize, char)> = haystack
        .chars()
        .enumerate()
        .flat_map(|(i, c)| c.to_lowercase().map(move |l| (i, l)))
        .collect();

    if folded.len() < needle.len() {
        return None;
    }

    (0..=folded.len() - needle.len())
        .find(|&start| {
            // Must begin on the first folded char of a source char.
            (start == 0 || folded[start - 1].0 != folded[start].0)
                && folded[start..start + needle.len()]
                    .iter()
                    .zip(&needle)
                    .all(|((_, h), n)| h == n)
        })
        .map(|start| folded[start].0)
}

/// Compute the relevance score for one snippet.
///
/// Returns `None` when neither content nor tags match. Also returns the
/// content match position for excerpt building.
pub fn score_snippet(snippet: &Snippet, query: &str) -> Option<(i64, Option<usize>)> {
    let content_at = if snippet.content.is_empty() {
        None
    } else {
        find_case_insensitive(&snippet.content, query)
    };
    let tag_hit = snippet
        .tags
        .iter()
        .any(|t| find_case_insensitive(t, query).is_some());

    if content_at.is_none() && !tag_hit {
        return None;
    }

    let mut score = 0;
    if let Some(idx) = content_at {
        score += CONTENT_HIT_SCORE;
        score += (POSITION_BONUS_WINDOW - idx as i64).max(0);
    }
    if tag_hit {
        score += TAG_HIT_SCORE;
    }
    let chars = snippet.content.chars().count();
    score -= ((chars / LENGTH_PENALTY_CHARS) as i64).min(LENGTH_PENALTY_CAP);

    Some((score, content_at))
}

/// Build a preview of at most [`EXCERPT_MAX_CHARS`] chars.
///
/// With a match, the window is centred on `match_at` and marked with `…`
/// on any side that does not reach the content boundary. Without one, the
/// excerpt is the content prefix with no ellipsis. Content short enough
/// to fit is returned whole.
pub fn build_excerpt(content: &str, match_at: Option<usize>, query_chars: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();

    let Some(idx) = match_at else {
        return chars.iter().take(EXCERPT_MAX_CHARS).collect();
    };
    if len <= EXCERPT_MAX_CHARS {
        return content.to_string();
    }

    // Room for the text once both ellipses are accounted for.
    let budget = EXCERPT_MAX_CHARS - 2;
    let lead = budget.saturating_sub(query_chars) / 2;
    let start = idx.saturating_sub(lead).min(len - budget);
    let end = (start + budget).min(len);

    let mut excerpt = String::with_capacity((end - start + 2) * 4);
    if start > 0 {
        excerpt.push(ELLIPSIS);
    }
    excerpt.extend(&chars[start..end]);
    if end < len {
        excerpt.push(ELLIPSIS);
    }
    excerpt
}

/// Rank every snippet in `corpus` against `query`.
///
/// An empty (after trimming) query returns no results. The corpus is
/// scanned linearly; no index is built.
pub fn global_search(corpus: &[Snippet], query: &str, limit: usize) -> Vec<SearchResult> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let query_chars = query.chars().count();

    let mut results: Vec<SearchResult> = corpus
        .iter()
        .filter_map(|s| {
            let (score, content_at) = score_snippet(s, query)?;
            Some(SearchResult {
                id: s.id.clone(),
                content: s.content.clone(),
                tags: s.tags.clone(),
                created_at: s.created_at,
                score,
                excerpt: build_excerpt(&s.content, content_at, query_chars),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.created_at.cmp(&a.created_at))
            .then(a.id.cmp(&b.id))
    });
    results.truncate(limit);
    results
}

/// Count tag usage across `corpus`.
///
/// Each snippet contributes at most one to any row, even if its tag list
/// repeats a value. Empty tag strings are skipped. Rows are sorted by
/// count (desc), then `tag` (asc).
pub fn tag_counts(corpus: &[Snippet], by: AggregateBy) -> Vec<TagCount> {
    struct Row {
        tag: String,
        count: usize,
    }

    let mut rows: HashMap<String, Row> = HashMap::new();

    for snippet in corpus {
        let mut seen: HashSet<String> = HashSet::new();
        for raw in snippet.tags.iter().filter(|t| !t.is_empty()) {
            let key = match by {
                AggregateBy::Raw => raw.clone(),
                AggregateBy::Slug => normalize_tag(raw),
            };
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            rows.entry(key)
                .or_insert_with(|| Row {
                    tag: raw.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }

    let mut counts: Vec<TagCount> = rows
        .into_iter()
        .map(|(key, row)| TagCount {
            slug: match by {
                AggregateBy::Raw => normalize_tag(&key),
                AggregateBy::Slug => key,
            },
            tag: row.tag,
            count: row.count,
        })
        .collect();

    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.tag.cmp(&b.tag))
            .then_with(|| a.slug.cmp(&b.slug))
    });
    counts
}

/// Load the full corpus from `store` and run [`global_search`].
pub async fn search_store<S: SnippetStore + ?Sized>(
    store: &S,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let corpus = store.list_snippets().await?;
    Ok(global_search(&corpus, query, limit))
}

/// Load the full corpus from `store` and run [`tag_counts`].
pub async fn list_tags<S: SnippetStore + ?Sized>(store: &S, by: AggregateBy) -> Result<Vec<TagCount>> {
    let corpus = store.list_snippets().await?;
    Ok(tag_counts(&corpus, by))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn snip(id: &str, content: &str, tags: &[&str]) -> Snippet {
        let mut s = Snippet::new(id, content, tags.iter().map(|t| t.to_string()).collect());
        s.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        s
    }

    #[test]
    fn test_find_case_insensitive() {
        assert_eq!(find_case_insensitive("Hello World", "world"), Some(6));
        assert_eq!(find_case_insensitive("Hello", "HELLO"), Some(0));
        assert_eq!(find_case_insensitive("Hello", "xyz"), None);
        assert_eq!(find_case_insensitive("ab", "abc"), None);
        assert_eq!(find_case_insensitive("", "a"), None);
    }

    #[test]
    fn test_find_reports_char_index_not_byte_index() {
        assert_eq!(find_case_insensitive("héllo wörld", "WÖRLD"), Some(6));
        // 'İ' folds to two chars; positions after it still line up.
        assert_eq!(find_case_insensitive("İx abc", "abc"), Some(3));
    }

    #[test]
    fn test_basic_match() {
        let corpus = vec![snip("1", "Hello world", &["js"]), snip("2", "Goodbye", &[])];
        let results = global_search(&corpus, "hello", DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "1");
        assert!(results[0].score >= 1000);
        // 1000 base + 200 position bonus at index 0, no length penalty.
        assert_eq!(results[0].score, 1200);
        assert_eq!(results[0].excerpt, "Hello world");
    }

    #[test]
    fn test_tag_only_match() {
        let corpus = vec![snip("1", "nothing relevant", &["react"])];
        let results = global_search(&corpus, "react", DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 250);
        assert_eq!(results[0].excerpt, "nothing relevant");
    }

    #[test]
    fn test_tag_hit_is_substring_and_case_insensitive() {
        let corpus = vec![snip("1", "body", &["ReactJS"])];
        let results = global_search(&corpus, "react", DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 250);
    }

    #[test]
    fn test_content_and_tag_hit_stack() {
        let corpus = vec![snip("1", "rust is fun", &["rust"])];
        let results = global_search(&corpus, "rust", DEFAULT_LIMIT);
        assert_eq!(results[0].score, 1000 + 250 + 200);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let corpus = vec![snip("1", "Hello", &["hello"])];
        assert!(global_search(&corpus, "", DEFAULT_LIMIT).is_empty());
        assert!(global_search(&corpus, "   \t", DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn test_query_is_trimmed() {
        let corpus = vec![snip("1", "Hello world", &[])];
        let results = global_search(&corpus, "  world  ", DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1000 + 200 - 6);
    }

    #[test]
    fn test_empty_corpus_returns_nothing() {
        assert!(global_search(&[], "x", DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn test_empty_content_never_content_matches() {
        let corpus = vec![snip("1", "", &["alpha"]), snip("2", "", &[])];
        let results = global_search(&corpus, "alpha", DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 250);
        assert_eq!(results[0].excerpt, "");
    }

    #[test]
    fn test_limit_truncation() {
        let corpus: Vec<Snippet> = (0..30)
            .map(|i| snip(&format!("s{:02}", i), &format!("item x {}", i), &[]))
            .collect();
        assert_eq!(global_search(&corpus, "x", DEFAULT_LIMIT).len(), 20);
        assert_eq!(global_search(&corpus, "x", 5).len(), 5);
        assert_eq!(global_search(&corpus, "x", 100).len(), 30);
    }

    #[test]
    fn test_earlier_match_ranks_higher() {
        let corpus = vec![
            snip("late", "aaaaaaaaaaaaaaaaaaaa needle", &[]),
            snip("early", "needle aaaaaaaaaaaaaaaaaaaa", &[]),
        ];
        let results = global_search(&corpus, "needle", DEFAULT_LIMIT);
        assert_eq!(results[0].id, "early");
        assert_eq!(results[1].id, "late");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_position_bonus_vanishes_after_200() {
        let content = format!("{}needle", "a".repeat(250));
        let corpus = vec![snip("1", &content, &[])];
        let results = global_search(&corpus, "needle", DEFAULT_LIMIT);
        assert_eq!(results[0].score, 1000);
    }

    #[test]
    fn test_length_penalty_is_capped() {
        let long = format!("needle {}", "b".repeat(100_000));
        let medium = format!("needle {}", "b".repeat(1_493));
        let corpus = vec![snip("long", &long, &[]), snip("medium", &medium, &[])];
        let results = global_search(&corpus, "needle", DEFAULT_LIMIT);
        let by_id: HashMap<_, _> = results.iter().map(|r| (r.id.as_str(), r.score)).collect();
        // 1500 chars -> -3; 100007 chars -> capped at -100.
        assert_eq!(by_id["medium"], 1200 - 3);
        assert_eq!(by_id["long"], 1200 - 100);
    }

    #[test]
    fn test_ties_break_by_created_at_then_id() {
        let mut older = snip("b", "same text", &[]);
        older.created_at = older.created_at - Duration::days(1);
        let corpus = vec![older, snip("c", "same text", &[]), snip("a", "same text", &[])];
        let ids: Vec<String> = global_search(&corpus, "same", DEFAULT_LIMIT)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_search_is_deterministic() {
        let corpus: Vec<Snippet> = (0..10)
            .map(|i| snip(&format!("{}", 9 - i), "tie tie", &["tie"]))
            .collect();
        let first = global_search(&corpus, "tie", 10);
        let second = global_search(&corpus, "tie", 10);
        assert_eq!(first, second);
    }

    #[test]
    fn test_excerpt_preserves_original_casing() {
        let corpus = vec![snip("1", "The QUICK brown fox", &[])];
        let results = global_search(&corpus, "quick", DEFAULT_LIMIT);
        assert_eq!(results[0].excerpt, "The QUICK brown fox");
    }

    #[test]
    fn test_excerpt_window_in_middle() {
        let content = format!("{}needle{}", "a".repeat(400), "b".repeat(94));
        assert_eq!(content.chars().count(), 500);
        let excerpt = build_excerpt(&content, Some(400), 6);
        let n = excerpt.chars().count();
        assert!(n <= EXCERPT_MAX_CHARS, "excerpt too long: {}", n);
        assert!(excerpt.starts_with('…'));
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.contains("needle"));
        // budget 138, lead (138 - 6) / 2 = 66 -> window [334, 472).
        assert_eq!(n, 140);
        assert_eq!(excerpt.chars().nth(1 + 66), Some('n'));
    }

    #[test]
    fn test_excerpt_window_at_end_has_no_trailing_ellipsis() {
        let content = format!("{}needle", "a".repeat(494));
        let excerpt = build_excerpt(&content, Some(494), 6);
        assert!(excerpt.starts_with('…'));
        assert!(!excerpt.ends_with('…'));
        assert!(excerpt.ends_with("needle"));
        assert_eq!(excerpt.chars().count(), 139);
    }

    #[test]
    fn test_excerpt_window_at_start_has_no_leading_ellipsis() {
        let content = format!("needle{}", "a".repeat(494));
        let excerpt = build_excerpt(&content, Some(0), 6);
        assert!(excerpt.starts_with("needle"));
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn test_excerpt_short_content_returned_whole() {
        let content = "x".repeat(EXCERPT_MAX_CHARS);
        assert_eq!(build_excerpt(&content, Some(70), 1), content);
    }

    #[test]
    fn test_excerpt_without_match_is_plain_prefix() {
        let content = "z".repeat(300);
        let excerpt = build_excerpt(&content, None, 3);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
        assert!(!excerpt.contains('…'));
    }

    #[test]
    fn test_excerpt_multibyte_does_not_panic() {
        let content = "日本語のテキスト".repeat(40);
        let at = find_case_insensitive(&content, "テキスト");
        let excerpt = build_excerpt(&content, at, 4);
        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_tag_counts_one_per_snippet() {
        let corpus = vec![snip("1", "", &["a", "a"]), snip("2", "", &["a"])];
        let counts = tag_counts(&corpus, AggregateBy::Raw);
        assert_eq!(
            counts,
            vec![TagCount {
                tag: "a".into(),
                slug: "a".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_tag_counts_sorted_by_count_then_tag() {
        let corpus = vec![
            snip("1", "", &["zeta", "beta"]),
            snip("2", "", &["zeta", "alpha"]),
            snip("3", "", &["zeta", "beta"]),
        ];
        let rows: Vec<(String, usize)> = tag_counts(&corpus, AggregateBy::Raw)
            .into_iter()
            .map(|t| (t.tag, t.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("zeta".to_string(), 3),
                ("beta".to_string(), 2),
                ("alpha".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_tag_counts_skip_empty_and_slug_raw_keys() {
        let corpus = vec![snip("1", "", &["", "Machine Learning"])];
        let counts = tag_counts(&corpus, AggregateBy::Raw);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].tag, "Machine Learning");
        assert_eq!(counts[0].slug, "machine-learning");
    }

    #[test]
    fn test_tag_counts_raw_keeps_spelling_variants_apart() {
        let corpus = vec![snip("1", "", &["JS"]), snip("2", "", &["js"])];
        let counts = tag_counts(&corpus, AggregateBy::Raw);
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|t| t.slug == "js" && t.count == 1));
    }

    #[test]
    fn test_tag_counts_slug_merges_spelling_variants() {
        let corpus = vec![
            snip("1", "", &["JS", "#js"]),
            snip("2", "", &["js"]),
            snip("3", "", &["  ", "rust"]),
        ];
        let counts = tag_counts(&corpus, AggregateBy::Slug);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].slug, "js");
        assert_eq!(counts[0].tag, "JS");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].slug, "rust");
    }

    #[test]
    fn test_tag_counts_empty_corpus() {
        assert!(tag_counts(&[], AggregateBy::Raw).is_empty());
    }

    #[test]
    fn test_aggregate_by_from_str() {
        assert_eq!("raw".parse::<AggregateBy>().unwrap(), AggregateBy::Raw);
        assert_eq!("slug".parse::<AggregateBy>().unwrap(), AggregateBy::Slug);
        assert!("canonical".parse::<AggregateBy>().is_err());
    }
}
