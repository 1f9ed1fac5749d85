//! Tag canonicalization.
//!
//! A canonical tag (slug) is lowercase, has at most one leading `#`
//! removed, has every whitespace run replaced by a single `-`, and carries
//! no leading or trailing hyphens. Canonicalization is total, and
//! idempotent for every slug that does not itself begin with `#` (a slug
//! such as `#js`, produced from `##js`, loses its remaining `#` when
//! canonicalized again).

use std::collections::HashSet;

/// Convert arbitrary user-entered tag text into its canonical form.
///
/// Only one leading `#` is removed: `"##js"` becomes `"#js"`.
///
/// ```
/// use snipvault_core::tags::normalize_tag;
///
/// assert_eq!(normalize_tag("  #JavaScript "), "javascript");
/// assert_eq!(normalize_tag("machine learning"), "machine-learning");
/// ```
pub fn normalize_tag(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let unhashed = lowered.strip_prefix('#').unwrap_or(&lowered);

    let mut dashed = String::with_capacity(unhashed.len());
    let mut in_space = false;
    for ch in unhashed.chars() {
        if ch.is_whitespace() {
            if !in_space {
                dashed.push('-');
                in_space = true;
            }
        } else {
            dashed.push(ch);
            in_space = false;
        }
    }

    dashed.trim_matches('-').to_string()
}

/// Canonicalize a list of tags, dropping empties and duplicates.
///
/// Output keeps first-occurrence order of the canonical values.
pub fn normalize_tags<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a slug not starting with '#' is a fixed point
        #[test]
        fn prop_idempotent_unless_hash_leading(input in any::<String>()) {
            let once = normalize_tag(&input);
            prop_assume!(!once.starts_with('#'));
            prop_assert_eq!(normalize_tag(&once), once);
        }

        /// Property: slugs carry no whitespace and no edge hyphens
        #[test]
        fn prop_slug_shape(input in any::<String>()) {
            let slug = normalize_tag(&input);
            prop_assert!(!slug.chars().any(char::is_whitespace));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }

        /// Property: normalize_tags yields distinct, non-empty slugs
        #[test]
        fn prop_tags_distinct_non_empty(inputs in prop::collection::vec("[ #a-cA-C\\t-]{0,6}", 0..12)) {
            let tags = normalize_tags(&inputs);
            let unique: HashSet<&String> = tags.iter().collect();
            prop_assert_eq!(unique.len(), tags.len());
            prop_assert!(tags.iter().all(|t| !t.is_empty()));
        }
    }

    #[test]
    fn test_lowercases_trims_strips_hash() {
        assert_eq!(normalize_tag("  #JavaScript "), "javascript");
    }

    #[test]
    fn test_internal_whitespace_to_hyphen() {
        assert_eq!(normalize_tag("machine learning"), "machine-learning");
        assert_eq!(normalize_tag("deep \t\n  learning"), "deep-learning");
    }

    #[test]
    fn test_only_one_hash_stripped() {
        // A second '#' is part of the tag, not a prefix marker.
        assert_eq!(normalize_tag("##js"), "#js");
    }

    #[test]
    fn test_edge_inputs_are_total() {
        assert_eq!(normalize_tag(""), "");
        assert_eq!(normalize_tag("   \t "), "");
        assert_eq!(normalize_tag("#"), "");
        assert_eq!(normalize_tag("---"), "");
        assert_eq!(normalize_tag("# "), "");
        assert_eq!(normalize_tag("-rust-"), "rust");
    }

    #[test]
    fn test_idempotent_on_tricky_inputs() {
        let inputs = [
            "  #JavaScript ",
            "A  B\tC",
            "-",
            "#",
            "İstanbul",
            "\u{3000}wide\u{3000}space",
            "c++ / rust",
            "",
        ];
        for input in inputs {
            let once = normalize_tag(input);
            assert_eq!(normalize_tag(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_hash_leading_slug_is_not_a_fixed_point() {
        // Second pass strips the surviving '#', so "##js" settles on "js".
        let once = normalize_tag("##js");
        assert_eq!(once, "#js");
        assert_eq!(normalize_tag(&once), "js");
        assert_eq!(normalize_tag("#-#a"), "#a");
        assert_eq!(normalize_tag("- #x"), "#x");
        assert_eq!(normalize_tag("# # y"), "#-y");
    }

    #[test]
    fn test_normalize_tags_dedupes_and_drops_empty() {
        assert_eq!(normalize_tags(&["JS", " #js ", ""]), vec!["js".to_string()]);
    }

    #[test]
    fn test_normalize_tags_keeps_first_occurrence_order() {
        let out = normalize_tags(&["Rust", "go", "#rust", "Go ", "zig"]);
        assert_eq!(out, vec!["rust", "go", "zig"]);
    }

    #[test]
    fn test_normalize_tags_empty_input() {
        let empty: [&str; 0] = [];
        assert!(normalize_tags(&empty).is_empty());
    }
}
