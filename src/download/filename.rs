//! Output file naming
//!
//! Resolution order: caller-supplied name, `Content-Disposition`, last URL path
//! segment, then a timestamped placeholder. Every candidate is sanitized and
//! then given an extension if it lacks a plausible one.

use reqwest::Url;
use std::time::{SystemTime, UNIX_EPOCH};

/// Characters that are unsafe in a file name on at least one supported platform
const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// URL-derived names longer than this are discarded
const MAX_URL_NAME_LEN: usize = 200;

/// Longest extension (dot included) accepted as real
const MAX_EXTENSION_LEN: usize = 5;

/// Replace every forbidden character with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// Value of the first `filename=` or `filename*=UTF-8''` parameter, scanning in header order
///
/// Only that first parameter counts. An empty or undecodable value yields `None`
/// even when a later parameter carries a name.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let name = header.split(';').map(str::trim).find_map(|part| {
        if let Some(value) = part.strip_prefix("filename=") {
            return Some(value.trim_matches('"').to_string());
        }
        part.strip_prefix("filename*=UTF-8''").map(|encoded| {
            urlencoding::decode(encoded)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_default()
        })
    })?;
    (!name.is_empty()).then_some(name)
}

/// Percent-decoded last path segment of `url`
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    if segment.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(segment).ok()?.into_owned();
    if decoded.is_empty() || decoded.contains('?') || decoded.chars().count() > MAX_URL_NAME_LEN {
        return None;
    }
    Some(decoded)
}

/// `download_<unix seconds>.tmp`
pub fn synthetic_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("download_{}.tmp", secs)
}

/// Blank names and names made only of dots cannot be created inside a directory
fn is_usable(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.chars().all(|c| c == '.')
}

/// Pick and sanitize the output name, before extension inference
pub fn resolve(desired: Option<&str>, url: &Url, content_disposition: Option<&str>) -> String {
    let name = desired
        .map(str::to_string)
        .filter(|name| is_usable(name))
        .or_else(|| {
            content_disposition
                .and_then(parse_content_disposition)
                .filter(|name| is_usable(name))
        })
        .or_else(|| filename_from_url(url).filter(|name| is_usable(name)))
        .unwrap_or_else(synthetic_name);
    sanitize(&name)
}

/// Text from the last `.` on, or empty when there is no dot
fn extension(name: &str) -> &str {
    name.rfind('.').map(|idx| &name[idx..]).unwrap_or("")
}

/// Append `.pdf`, `.epub` or `.download` when `name` has no usable extension
pub fn ensure_extension(name: String, content_type: Option<&str>) -> String {
    let ext = extension(&name);
    if !ext.is_empty() && ext.chars().count() <= MAX_EXTENSION_LEN {
        return name;
    }

    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    let suffix = if content_type.contains("pdf") {
        ".pdf"
    } else if content_type.contains("epub") {
        ".epub"
    } else {
        ".download"
    };
    name + suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[rstest]
    #[case(r#"attachment; filename="test.pdf""#, Some("test.pdf"))]
    #[case("attachment; filename=test.pdf", Some("test.pdf"))]
    #[case(r#"inline; filename="book.epub""#, Some("book.epub"))]
    #[case("attachment; filename*=UTF-8''%e2%82%ac.pdf", Some("€.pdf"))]
    #[case("attachment; filename*=UTF-8''my%20book.epub", Some("my book.epub"))]
    // Header order decides, not parameter type.
    #[case(r#"attachment; filename="plain.pdf"; filename*=UTF-8''fancy.pdf"#, Some("plain.pdf"))]
    #[case(r#"attachment; filename*=UTF-8''fancy.pdf; filename="plain.pdf""#, Some("fancy.pdf"))]
    // Only the first filename parameter counts, even when its value is empty.
    #[case(r#"attachment; filename=""; filename*=UTF-8''next.pdf"#, None)]
    #[case("attachment; filename*=UTF-8''; filename=next.pdf", None)]
    // Other charsets are not recognised, so the scan moves past them.
    #[case("attachment; filename*=ISO-8859-1''old.pdf; filename=next.pdf", Some("next.pdf"))]
    #[case("attachment", None)]
    #[case("", None)]
    #[case("attachment; name=field", None)]
    fn test_parse_content_disposition(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_content_disposition(header).as_deref(), expected);
    }

    #[rstest]
    #[case("https://example.com/files/book.pdf", Some("book.pdf"))]
    #[case("https://example.com/files/book.pdf?token=abc", Some("book.pdf"))]
    #[case("https://example.com/files/my%20book.epub", Some("my book.epub"))]
    #[case("https://example.com/files/%E4%B9%A6.pdf", Some("书.pdf"))]
    #[case("https://example.com/files/", None)]
    #[case("https://example.com", None)]
    // A decoded '?' means the name was mangled.
    #[case("https://example.com/files/what%3F.pdf", None)]
    fn test_filename_from_url(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(filename_from_url(&url(input)).as_deref(), expected);
    }

    #[test]
    fn test_filename_from_url_length_limit() {
        let long = "a".repeat(MAX_URL_NAME_LEN + 1);
        assert_eq!(filename_from_url(&url(&format!("https://example.com/{}", long))), None);

        let exact = "a".repeat(MAX_URL_NAME_LEN);
        assert_eq!(
            filename_from_url(&url(&format!("https://example.com/{}", exact))),
            Some(exact)
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(r#"a/b\c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize("plain name.epub"), "plain name.epub");
    }

    #[rstest]
    #[case("AC/DC: Live?")]
    #[case("<<|>>")]
    #[case("already_clean.pdf")]
    fn test_sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
        assert!(!once.contains(FORBIDDEN));
    }

    #[test]
    fn test_resolve_order() {
        let source = url("https://example.com/get/from-url.pdf");
        let cd = Some(r#"attachment; filename="from-header.pdf""#);

        assert_eq!(resolve(Some("mine.epub"), &source, cd), "mine.epub");
        assert_eq!(resolve(None, &source, cd), "from-header.pdf");
        assert_eq!(resolve(None, &source, None), "from-url.pdf");
        assert_eq!(resolve(Some("  "), &source, None), "from-url.pdf");

        let bare = url("https://example.com/");
        let name = resolve(None, &bare, Some("attachment"));
        assert!(name.starts_with("download_") && name.ends_with(".tmp"));
    }

    #[test]
    fn test_resolve_sanitizes_every_source() {
        let source = url("https://example.com/get/x.pdf");
        assert_eq!(resolve(Some("a/b.pdf"), &source, None), "a_b.pdf");
        assert_eq!(
            resolve(None, &source, Some(r#"attachment; filename="c:d.pdf""#)),
            "c_d.pdf"
        );
    }

    #[test]
    fn test_resolve_empty_header_value_falls_back_to_url() {
        let source = url("https://example.com/get/from-url.pdf");
        let cd = Some(r#"attachment; filename=""; filename*=UTF-8''later.pdf"#);
        assert_eq!(resolve(None, &source, cd), "from-url.pdf");
    }

    #[rstest]
    #[case(r#"attachment; filename="..""#)]
    #[case(r#"attachment; filename=".""#)]
    #[case("attachment; filename*=UTF-8''%2E%2E")]
    #[case(r#"attachment; filename=" ""#)]
    fn test_resolve_rejects_unusable_header_names(#[case] header: &str) {
        let source = url("https://example.com/get/from-url.pdf");
        let name = ensure_extension(resolve(None, &source, Some(header)), None);
        assert_eq!(name, "from-url.pdf");
    }

    #[test]
    fn test_resolve_rejects_dot_only_desired_name() {
        let source = url("https://example.com/get/from-url.pdf");
        assert_eq!(resolve(Some(".."), &source, None), "from-url.pdf");
    }

    #[rstest]
    #[case("book.pdf", None, "book.pdf")]
    #[case("book.epub", Some("application/pdf"), "book.epub")]
    #[case("book", Some("application/pdf"), "book.pdf")]
    #[case("book", Some("application/epub+zip"), "book.epub")]
    #[case("book", Some("application/octet-stream"), "book.download")]
    #[case("book", None, "book.download")]
    // ".tmp1234" is too long to be a real extension.
    #[case("download.tmp1234", Some("application/pdf"), "download.tmp1234.pdf")]
    #[case("v1.0.final", Some("text/html"), "v1.0.final.download")]
    fn test_ensure_extension(
        #[case] name: &str,
        #[case] content_type: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(ensure_extension(name.to_string(), content_type), expected);
    }
}
