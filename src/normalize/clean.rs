use once_cell::sync::Lazy;
use regex::Regex;

/// Auto-generated or missing header names: `nan`, `None`, `Unnamed: 7`, `12`.
static PLACEHOLDER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:nan|none|unnamed(?:[\s:_.-]*\d+)?|\d+)$").expect("valid placeholder regex")
});

/// A line break run plus the spaces hugging it.
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*[\r\n]+[ \t]*").expect("valid line break regex"));

/// Trim and collapse embedded line breaks to one space.
pub fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(['\r', '\n']) {
        LINE_BREAKS.replace_all(trimmed, " ").into_owned()
    } else {
        trimmed.to_string()
    }
}

/// Header text as used for matching: cleaned and upper-cased.
pub fn normalize_label(raw: &str) -> String {
    clean_cell(raw).to_uppercase()
}

/// True for labels that carry no meaning and should take their column with them.
pub fn is_placeholder_label(label: &str) -> bool {
    label.is_empty() || PLACEHOLDER_LABEL.is_match(label)
}

/// Textual stand-ins for a missing value left behind by earlier exports.
pub fn is_blank_value(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("none")
}
