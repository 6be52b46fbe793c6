/// Reduces an uploaded filename to a safe single path segment.
///
/// Path separators and whitespace runs become a single `_`, and only ASCII
/// alphanumerics, `.`, `-` and `_` survive. Leading and trailing dots and
/// underscores are stripped so the result can never be hidden or climb out
/// of the upload directory.
pub fn sanitize_filename(filename: &str) -> String {
    let mut cleaned = String::with_capacity(filename.len());
    let mut pending_separator = false;

    for c in filename.chars() {
        if c.is_whitespace() || c == '/' || c == '\\' {
            pending_separator = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')) {
            continue;
        }
        if pending_separator && !cleaned.is_empty() {
            cleaned.push('_');
        }
        pending_separator = false;
        cleaned.push(c);
    }

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
