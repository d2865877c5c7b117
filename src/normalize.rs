// src/normalize.rs

/// Trims a raw query name. Blank input yields `None`, which the resolver treats
/// as a no-match.
pub fn clean_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Unicode lowercase used for case-insensitive comparisons.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Literal, case-insensitive containment of `needle` inside `haystack`.
///
/// Regex metacharacters in the needle have no special meaning here.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}

/// Escapes `\`, `%` and `_` so the text matches itself in a `LIKE ... ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%<escaped>%` pattern for an ILIKE containment lookup.
pub fn like_contains_pattern(s: &str) -> String {
    format!("%{}%", escape_like(s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("  대박드림스 "), Some("대박드림스"));
        assert_eq!(clean_query("   "), None);
        assert_eq!(clean_query(""), None);
    }

    #[test]
    fn test_contains_ignore_case_is_literal() {
        assert!(contains_ignore_case("ACME Corp (Seoul)", "corp (seoul"));
        assert!(contains_ignore_case("a.b*c", "a.b*"));
        assert!(!contains_ignore_case("axbc", "a.b"));
    }

    #[test]
    fn test_like_pattern_escaping() {
        assert_eq!(escape_like("100%_sure\\"), "100\\%\\_sure\\\\");
        assert_eq!(like_contains_pattern(" 티벌컨 "), "%티벌컨%");
    }
}
