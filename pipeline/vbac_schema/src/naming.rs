//! Derived feature-column naming.
//!
//! One function turns field names and category labels into column identifiers so the
//! offline and online paths can never disagree about spelling.

/// Separator placed between a categorical field and its label in indicator names.
pub const INDICATOR_SEPARATOR: char = '_';

/// Normalise a human-facing name into a column identifier.
///
/// Apostrophes are removed, every run of other non-alphanumeric characters becomes a
/// single `_`, and leading/trailing separators are trimmed.
///
/// ```
/// use vbac_schema::naming::column_name;
/// assert_eq!(column_name("Mother's Age"), "Mothers_Age");
/// assert_eq!(column_name("Pre-pregnancy BMI"), "Pre_pregnancy_BMI");
/// ```
pub fn column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push(INDICATOR_SEPARATOR);
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Name of the indicator column for `label` of a categorical `field`.
pub fn indicator_name(field: &str, label: &str) -> String {
    format!(
        "{}{}{}",
        column_name(field),
        INDICATOR_SEPARATOR,
        column_name(label)
    )
}
