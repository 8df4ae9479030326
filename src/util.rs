//! Shared utility functions

use std::sync::LazyLock;

use regex::Regex;

static INVALID_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\u{00BF}-\u{1FFF}\u{2C00}-\u{D7FF}]+").unwrap());

static VALID_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^['" \-+.*\[\]0-9\u{00BF}-\u{1FFF}\u{2C00}-\u{D7FF}\w]+$"#).unwrap()
});

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, replaces runs of disallowed characters with a single `-`,
/// and trims leading/trailing dashes. Returns an empty string when nothing
/// sluggable remains.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let replaced = INVALID_SLUG_CHARS.replace_all(&lowered, "-");
    replaced.trim_matches('-').to_string()
}

/// Check whether a username contains only permitted characters.
pub fn is_username_valid(username: &str) -> bool {
    !username.is_empty() && username == username.trim() && VALID_USERNAME.is_match(username)
}

/// Interpret a boolean-string request flag ("1"/"true" are truthy).
pub fn is_flag_set(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// Check whether a string parses as a finite number.
pub fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
}
