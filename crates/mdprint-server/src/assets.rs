//! Images referenced by previewed documents.
//!
//! Relative `<img src>` values only make sense next to the source file, so
//! previews point them at `/api/v1/image/` with a root-relative path instead.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Route prefix images are served under.
pub(crate) const IMAGE_ROUTE: &str = "/api/v1/image/";

/// `src` attribute of an `<img>` tag, double-quoted as the renderer emits it.
static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<img\b[^>]*?\ssrc=")([^"]*)(")"#).unwrap());

/// Content type for a servable image, `None` for anything else.
pub(crate) fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(content_type)
}

/// Point relative image sources in `html` at the image route.
///
/// `doc_dir` is the document's directory relative to the root (`""` for the
/// root itself). Absolute URLs, data URIs, and paths climbing above the root
/// are left as they are.
pub(crate) fn rewrite_image_sources(html: &str, doc_dir: &str) -> String {
    IMG_SRC_RE
        .replace_all(html, |caps: &Captures| {
            let src = &caps[2];
            match root_relative(doc_dir, src) {
                Some(path) => format!("{}{IMAGE_ROUTE}{path}{}", &caps[1], &caps[3]),
                None => caps[0].to_owned(),
            }
        })
        .into_owned()
}

/// Join `src` onto `doc_dir`, resolving `.` and `..` segments.
fn root_relative(doc_dir: &str, src: &str) -> Option<String> {
    if src.is_empty() || src.starts_with(['/', '#', '?']) || has_scheme(src) {
        return None;
    }

    let mut segments: Vec<&str> = doc_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in src.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Whether `src` starts with a URL scheme such as `https:` or `data:`.
fn has_scheme(src: &str) -> bool {
    src.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && !scheme.contains('/')
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("a.png")), Some("image/png"));
        assert_eq!(image_content_type(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("a.svg")), Some("image/svg+xml"));
        assert_eq!(image_content_type(Path::new("a.md")), None);
        assert_eq!(image_content_type(Path::new("Makefile")), None);
    }

    #[test]
    fn test_rewrite_relative_sources() {
        let html = r#"<p><img src="pic.png" alt="Pic"> <img src="./img/b.svg" alt="B"></p>"#;
        assert_eq!(
            rewrite_image_sources(html, "guide"),
            r#"<p><img src="/api/v1/image/guide/pic.png" alt="Pic"> <img src="/api/v1/image/guide/img/b.svg" alt="B"></p>"#
        );
    }

    #[test]
    fn test_rewrite_parent_sources() {
        assert_eq!(
            rewrite_image_sources(r#"<img src="../shared/logo.png">"#, "guide/deep"),
            r#"<img src="/api/v1/image/guide/shared/logo.png">"#
        );
        // Climbing above the root stays untouched.
        assert_eq!(
            rewrite_image_sources(r#"<img src="../logo.png">"#, ""),
            r#"<img src="../logo.png">"#
        );
    }

    #[test]
    fn test_rewrite_skips_absolute_sources() {
        let html = concat!(
            r#"<img src="https://example.com/a.png">"#,
            r#"<img src="data:image/png;base64,AAAA">"#,
            r#"<img src="/static/a.png">"#,
            r#"<img alt="diagram 0">"#,
        );
        assert_eq!(rewrite_image_sources(html, "guide"), html);
    }

    #[test]
    fn test_rewrite_ignores_other_tags() {
        let html = r#"<script src="app.js"></script><a href="pic.png">pic</a>"#;
        assert_eq!(rewrite_image_sources(html, ""), html);
    }
}
