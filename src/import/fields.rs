use chrono::NaiveDate;

/// Closed truthy-token set; everything else (including blanks) reads false.
pub fn parse_boolish(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "oui"
    )
}

/// Positive integer with a per-field default when the cell is absent.
pub fn parse_positive_int(
    value: Option<&str>,
    default: i64,
    label: &str,
) -> Result<i64, String> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("{label} must be a positive number")),
    }
}

/// Integer restricted to an inclusive range, with a default when absent.
pub fn parse_int_in_range(
    value: Option<&str>,
    default: i64,
    min: i64,
    max: i64,
    label: &str,
) -> Result<i64, String> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= min && n <= max => Ok(n),
        _ => Err(format!("{label} must be between {min} and {max}")),
    }
}

/// Shape check only: one @, a non-empty local part, a dot in the domain.
pub fn looks_like_email(s: &str) -> bool {
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.len() >= 3 && domain.contains('.') && !domain.starts_with('.')
}

const DAY_NAMES: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Weekday from an English name (full or 3-letter) or a number 0..6,
/// 0 = Monday.
pub fn parse_weekday(s: &str) -> Option<i64> {
    let t = s.trim().to_ascii_lowercase();
    if let Ok(n) = t.parse::<i64>() {
        return (0..=6).contains(&n).then_some(n);
    }
    DAY_NAMES
        .iter()
        .position(|d| *d == t || (t.len() == 3 && d.starts_with(&t)))
        .map(|i| i as i64)
}

pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Upper-cases and joins whitespace runs with `_`, the storage form for the
/// closed room-type / category / event-type enums.
pub fn normalize_enum_token(s: &str) -> String {
    s.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}
