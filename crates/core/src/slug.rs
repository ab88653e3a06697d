//! Slug derivation for License records.
//!
//! A slug is derived from the license name by transliterating to ASCII, dropping
//! punctuation, lowercasing and joining words with single hyphens:
//!
//! ```text
//! "Creative Commons BY 4.0"  ->  creative-commons-by-40
//! "GPL-3.0+"                 ->  gpl-30
//! "!!!"                      ->  license
//! ```
//!
//! When the candidate is already taken, `-1`, `-2`, ... are appended until a free
//! slug is found. The result depends only on the name and the slug set passed in.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use crate::constants::{SLUG_FALLBACK, SLUG_MAX_LEN};

/// Normalises `name` into slug form without any collision handling.
///
/// Returns an empty string when nothing slug-worthy survives normalisation.
pub fn normalize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_separator = true;
        }
    }

    trim_edge_separators(&slug).to_owned()
}

/// Returns true if `slug` only contains ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Assigns a unique slug for `name` against the slugs currently in use.
///
/// `self_slug` is the slug already held by the record being saved; it is not
/// treated as a conflict so an update never collides with itself.
pub fn assign(name: &str, existing_slugs: &HashSet<String>, self_slug: Option<&str>) -> String {
    let mut base = normalize(name);
    if base.is_empty() {
        base = SLUG_FALLBACK.to_owned();
    }
    truncate_ascii(&mut base, SLUG_MAX_LEN);
    let base = trim_edge_separators(&base).to_owned();

    let taken = |candidate: &str| {
        existing_slugs.contains(candidate) && self_slug != Some(candidate)
    };

    if !taken(&base) {
        return base;
    }

    let mut counter: u64 = 1;
    loop {
        let suffix = format!("-{counter}");
        let mut stem = base.clone();
        truncate_ascii(&mut stem, SLUG_MAX_LEN.saturating_sub(suffix.len()));
        let candidate = format!("{}{}", trim_edge_separators(&stem), suffix);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn trim_edge_separators(value: &str) -> &str {
    value.trim_matches(|c| c == '-' || c == '_')
}

fn truncate_ascii(value: &mut String, max: usize) {
    if value.len() > max {
        value.truncate(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugs(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_follows_word_boundaries() {
        assert_eq!(normalize("MIT License"), "mit-license");
        assert_eq!(normalize("Creative Commons BY 4.0"), "creative-commons-by-40");
        assert_eq!(normalize("GPL-3.0+"), "gpl-30");
        assert_eq!(normalize("  Apache   License -- 2.0 "), "apache-license-20");
        assert_eq!(normalize("Test License!!!"), "test-license");
    }

    #[test]
    fn normalize_transliterates_accents() {
        assert_eq!(normalize("Licence Publique Générale"), "licence-publique-generale");
        assert_eq!(normalize("Ｆｕｌｌｗｉｄｔｈ"), "fullwidth");
    }

    #[test]
    fn normalize_strips_edge_separators() {
        assert_eq!(normalize("--_zlib_--"), "zlib");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("日本語"), "");
    }

    #[test]
    fn assign_uses_fallback_for_empty_normalisation() {
        assert_eq!(assign("!!!", &HashSet::new(), None), "license");
        assert_eq!(assign("!!!", &slugs(&["license"]), None), "license-1");
    }

    #[test]
    fn assign_appends_first_free_counter() {
        let existing = slugs(&["test-license"]);
        assert_eq!(assign("Test License!!!", &existing, None), "test-license-1");

        let existing = slugs(&["test-license", "test-license-1", "test-license-3"]);
        assert_eq!(assign("Test License", &existing, None), "test-license-2");
    }

    #[test]
    fn assign_ignores_own_slug() {
        let existing = slugs(&["bsd-license", "mit-license"]);
        assert_eq!(
            assign("BSD License", &existing, Some("bsd-license")),
            "bsd-license"
        );
        assert_eq!(
            assign("MIT License", &existing, Some("bsd-license")),
            "mit-license-1"
        );
    }

    #[test]
    fn assign_is_deterministic_and_idempotent() {
        let existing = slugs(&["gpl-30", "gpl-30-1"]);
        let first = assign("GPL-3.0+", &existing, None);
        let second = assign("GPL-3.0+", &existing, None);
        assert_eq!(first, second);
        assert_eq!(first, "gpl-30-2");

        let empty = HashSet::new();
        let slug = assign("Mozilla Public License 2.0", &empty, None);
        assert_eq!(assign(&slug, &empty, None), slug);
    }

    #[test]
    fn assign_keeps_suffixed_slug_within_limit() {
        let long_name = "a".repeat(300);
        let base = assign(&long_name, &HashSet::new(), None);
        assert_eq!(base.len(), SLUG_MAX_LEN);

        let suffixed = assign(&long_name, &slugs(&[base.as_str()]), None);
        assert_eq!(suffixed.len(), SLUG_MAX_LEN);
        assert!(suffixed.ends_with("-1"));
    }

    #[test]
    fn assign_never_ends_on_a_separator_after_truncation() {
        let name = format!("{} bc", "a".repeat(254));
        let base = assign(&name, &HashSet::new(), None);
        assert_eq!(base, "a".repeat(254));
        assert!(is_valid_slug(&base));
        assert_eq!(assign(&base, &HashSet::new(), None), base);

        let suffixed = assign(&name, &slugs(&[base.as_str()]), None);
        assert!(!suffixed.contains("--"));
        assert!(suffixed.ends_with("-1"));
        assert!(suffixed.len() <= SLUG_MAX_LEN);

        let name = format!("{} b_ c", "a".repeat(252));
        let base = assign(&name, &HashSet::new(), None);
        assert_eq!(base, format!("{}-b", "a".repeat(252)));
    }

    #[test]
    fn is_valid_slug_rejects_unsafe_characters() {
        assert!(is_valid_slug("custom-mit_slug-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("gpl/3.0"));
    }
}
