use crate::error::{Error, Result};

/// Upper-cases the first letter of each word and lower-cases the rest.
///
/// Words start at the beginning of the string and after whitespace or a hyphen.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace() || c == '-';
    }

    out
}

/// Trims a submitted field. A blank value counts as not submitted.
pub fn trimmed(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parses a submitted formula id. Blank means "no id".
pub fn parse_formula_id(raw: &str) -> Result<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| Error::Validation(format!("formula_id '{raw}' is not a valid id")))
}
