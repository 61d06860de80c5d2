use std::{borrow::Cow, fmt};

/// Field contents read as a missing cell (the empty field is always missing).
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Text a missing cell turns into when it has to be treated as a string.
pub const MISSING_TEXT: &str = "nan";

/// A single cell of a [`RecordSet`](super::RecordSet).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    /// Field text of a cell in an all-numeric column, kept as read so IDs
    /// and spellings like `+2` or `Infinity` survive unchanged.
    Number(String),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn number(s: impl Into<String>) -> Self {
        Value::Number(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form used by derivations; missing cells become `nan`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Missing => Cow::Borrowed(MISSING_TEXT),
            Value::Number(s) | Value::Text(s) => Cow::Borrowed(s),
        }
    }

    /// String form written to CSV output; missing cells become empty fields.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            Value::Missing => Cow::Borrowed(""),
            other => other.to_text(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str("NaN"),
            Value::Number(s) | Value::Text(s) => f.write_str(s),
        }
    }
}

pub fn is_na_token(raw: &str) -> bool {
    raw.is_empty() || NA_TOKENS.contains(&raw)
}

/// Whether a raw field reads as a number. NaN spellings are missing markers,
/// not numbers.
pub fn is_number(raw: &str) -> bool {
    raw.trim().parse::<f64>().map_or(false, |n| !n.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn na_tokens_and_numbers() {
        assert!(is_na_token(""));
        assert!(is_na_token("N/A"));
        assert!(is_na_token("null"));
        assert!(!is_na_token("NONE"));
        assert!(is_number("12"));
        assert!(is_number(" 1.5 "));
        assert!(is_number("Infinity"));
        assert!(!is_number("NAN"));
        assert!(!is_number("AB_12"));
    }

    #[test]
    fn textual_forms() {
        assert_eq!(Value::Missing.to_text(), "nan");
        assert_eq!(Value::Missing.to_field(), "");
        assert_eq!(Value::number("12345678901234567").to_field(), "12345678901234567");
        assert_eq!(Value::number("+2").to_text(), "+2");
        assert_eq!(Value::number("Infinity").to_string(), "Infinity");
        assert_eq!(Value::text("x").to_field(), "x");
    }
}
