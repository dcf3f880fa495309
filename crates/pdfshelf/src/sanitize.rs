//! Helpers for turning user-supplied names into safe on-disk names and for
//! keeping full paths out of log fields.

use std::path::Path;

const FALLBACK_NAME: &str = "document.pdf";

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an uploaded file name to a single safe path component.
///
/// - directory parts (either separator) are dropped
/// - whitespace becomes `_`
/// - control and reserved characters become `_`
/// - leading dots are stripped so the result is never hidden or `..`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            c if c.is_control() => '_',
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Builds the stored file name `{id}-{sanitized name}`.
pub fn stored_file_name(id: &str, original_name: &str) -> String {
    format!("{}-{}", id, sanitize_file_name(original_name))
}

/// Returns true when `name` is usable as-is inside the upload directory.
pub fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/srv/pdfshelf/uploads/pdfs/abc-invoice.pdf")),
            "abc-invoice.pdf"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("Q1-2024_final.pdf"), "Q1-2024_final.pdf");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\plan.pdf"), "plan.pdf");
    }

    #[test]
    fn test_sanitize_replaces_whitespace_and_reserved() {
        assert_eq!(sanitize_file_name("my plan?.pdf"), "my_plan_.pdf");
        assert_eq!(sanitize_file_name("a\tb.pdf"), "a_b.pdf");
    }

    #[test]
    fn test_sanitize_never_returns_hidden_or_empty() {
        assert_eq!(sanitize_file_name(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_file_name(".."), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("   "), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("dir/"), FALLBACK_NAME);
    }

    #[test]
    fn test_stored_file_name() {
        assert_eq!(stored_file_name("abc", "my report.pdf"), "abc-my_report.pdf");
    }

    #[test]
    fn test_is_single_component() {
        assert!(is_single_component("abc-report.pdf"));
        assert!(!is_single_component("../x.pdf"));
        assert!(!is_single_component(".."));
        assert!(!is_single_component(""));
    }
}
