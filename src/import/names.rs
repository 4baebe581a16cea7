use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical comparison key for free-text identifiers: trimmed, lower-cased,
/// inner whitespace collapsed to single spaces, diacritics folded away
/// (NFD decomposition with combining marks dropped).
pub fn normalize_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        out.extend(ch.to_lowercase());
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// First entry whose normalized key equals the candidate's. Ties resolve to
/// the first match in store iteration order.
pub fn find_by_name<'a, T>(
    items: &'a [T],
    candidate: &str,
    key: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let want = normalize_name(candidate);
    items.iter().find(|it| normalize_name(key(it)) == want)
}

/// Reference resolver used by the validators for every free-text FK mention.
/// A miss appends one `Unknown <kind>: <name>` message, so several unresolved
/// names in the same field all end up in the row's error list.
pub fn resolve_or_report<'a, T>(
    items: &'a [T],
    name: &str,
    kind: &str,
    key: impl Fn(&T) -> &str,
    errors: &mut Vec<String>,
) -> Option<&'a T> {
    let found = find_by_name(items, name, key);
    if found.is_none() {
        errors.push(format!("Unknown {kind}: {name}"));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_space_and_diacritics() {
        assert_eq!(normalize_name("  Ahmed   Ben\tAli "), "ahmed ben ali");
        assert_eq!(normalize_name("Téléphone"), "telephone");
        assert_eq!(normalize_name("FRANÇAIS"), "francais");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn find_by_name_is_first_match_wins() {
        let items = vec![
            ("a", "Math"),
            ("b", "math  "),
            ("c", "Physics"),
        ];
        let hit = find_by_name(&items, "MATH", |it| it.1).expect("match");
        assert_eq!(hit.0, "a");
        assert!(find_by_name(&items, "Chemistry", |it| it.1).is_none());
    }

    #[test]
    fn resolve_or_report_collects_every_miss() {
        let items = vec![("a", "Math")];
        let mut errors = Vec::new();
        assert!(resolve_or_report(&items, "Math", "subject", |it| it.1, &mut errors).is_some());
        assert!(resolve_or_report(&items, "Physics", "subject", |it| it.1, &mut errors).is_none());
        assert!(resolve_or_report(&items, "Drawing", "subject", |it| it.1, &mut errors).is_none());
        assert_eq!(
            errors,
            vec![
                "Unknown subject: Physics".to_string(),
                "Unknown subject: Drawing".to_string()
            ]
        );
    }
}
