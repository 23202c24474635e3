//! Small text-cleaning helpers shared by the loaders.

/// Lower-cases a header and joins its words with underscores.
///
/// `"Effective Date Year"` becomes `"effective_date_year"`.
pub fn normalize_column_name(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Trims and title-cases a categorical value.
///
/// A letter is upper-cased when it follows a non-letter (or starts the
/// string) and lower-cased otherwise, so `"  pERMISSIVE "` becomes
/// `"Permissive"` and `"see note"` becomes `"See Note"`.
pub fn clean_category(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;

    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}

/// Drops every character that is not an ASCII digit or `.`.
pub fn strip_to_numeric(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

/// Parses a noisy death count such as `"1,234"` or `" 87 *"`.
///
/// Returns `None` when nothing numeric is left or the remainder is not a
/// whole, non-negative number.
pub fn parse_count(raw: &str) -> Option<u64> {
    let digits = strip_to_numeric(raw);
    if digits.is_empty() {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Column name for a law class in the wide per-class block.
///
/// `"Background Checks"` becomes `"strength_background_checks"`. A blank
/// class maps to `"strength_unspecified"`.
pub fn class_column_name(law_class: &str) -> String {
    let slug: String = law_class
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();

    if slug.is_empty() {
        "strength_unspecified".to_string()
    } else {
        format!("strength_{slug}")
    }
}
