// src/catalog/text.rs
//! Text primitives shared by the filter pipeline: accent-insensitive
//! normalization for comparisons, and a scrubber for ingested catalog text.
//!
//! `normalize` is the single comparison key used everywhere — query text and
//! every compared field go through the same fold, so "Tecnología" == "TECNOLOGIA".

/// Fold one lowercase char to its unaccented Latin base.
/// Combining marks themselves are dropped by the caller.
fn fold_accent(c: char) -> Option<char> {
    let out = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        // Stray combining marks (text already decomposed upstream).
        '\u{0300}'..='\u{036F}' => return None,
        other => other,
    };
    Some(out)
}

/// Accent-stripping, case-folding, trimming normalization.
/// Applied uniformly to query text and all compared fields.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().chars() {
        for lc in ch.to_lowercase() {
            if let Some(folded) = fold_accent(lc) {
                out.push(folded);
            }
        }
    }
    out
}

/// Substring match under normalization. Empty needles match nothing —
/// the pipeline treats an empty query as "no search", not "match all".
pub fn contains_normalized(haystack: &str, normalized_needle: &str) -> bool {
    if normalized_needle.is_empty() {
        return false;
    }
    normalize(haystack).contains(normalized_needle)
}

/// Scrub text coming off the wire: decode HTML entities, strip tags,
/// collapse whitespace, trim. Product names and descriptions arrive
/// in whatever shape sellers typed them.
pub fn scrub_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Anonymized short hash for dev logging — search queries are user input
/// and never logged raw.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_case() {
        assert_eq!(normalize("TECNOLOGÍA"), "tecnologia");
        assert_eq!(normalize("  Calzado Deportivo "), "calzado deportivo");
        assert_eq!(normalize("Niño"), "nino");
        assert_eq!(normalize("CAFÉ über"), "cafe uber");
    }

    #[test]
    fn normalize_drops_stray_combining_marks() {
        // "e" + combining acute, as a pre-decomposed source might send it
        assert_eq!(normalize("cafe\u{0301}"), "cafe");
    }

    #[test]
    fn contains_is_accent_insensitive_both_ways() {
        let q = normalize("tecnologia");
        assert!(contains_normalized("TECNOLOGÍA", &q));
        let q2 = normalize("TECNOLOGÍA");
        assert!(contains_normalized("tecnologia y más", &q2));
    }

    #[test]
    fn empty_needle_never_matches() {
        assert!(!contains_normalized("anything", ""));
    }

    #[test]
    fn scrub_decodes_entities_and_collapses_ws() {
        let s = "  Teclado&nbsp;&nbsp;mec\u{00E1}nico <b>RGB</b>  ";
        assert_eq!(scrub_text(s), "Teclado mec\u{00E1}nico RGB");
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("zapatos");
        let b = anon_hash("zapatos");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }
}
