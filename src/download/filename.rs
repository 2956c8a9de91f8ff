//! Filesystem-safe names for downloaded files.

/// Reduces a server-suggested filename to `[A-Za-z0-9._-]`.
///
/// Path separators become word breaks, whitespace runs collapse to `_`,
/// other characters (including all non-ASCII) are dropped, and leading or
/// trailing `.`/`_` are stripped. May return an empty string.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
