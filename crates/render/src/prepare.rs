//! HTML pre-processing before the document is handed to the browser.
//!
//! The document is loaded from a temporary file, so relative references
//! (`./img.png`, `style.css`) would resolve against the temporary directory.
//! [`inject_base_tag`] points them back at the original location, and
//! [`wrap_with_extra_css`] inlines an additional stylesheet.
//!
//! Both operations only ever touch the *first* matching head tag. Malformed
//! documents (several heads, an existing `<base>`) are not validated.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `<head>`, `<head/>` or `<head lang="en">`, but never `<header>`.
regex!(HEAD_OPEN_REGEX, r"(?i)<head(?:\s[^>]*)?/?>");
regex!(HEAD_CLOSE_REGEX, r"(?i)</head\s*>");

fn skeleton(head: &str, body: &str) -> String {
    format!("<!doctype html><html><head>{head}</head><body>{body}</body></html>")
}

/// Insert `<base href="…">` right after the first opening head tag, or wrap
/// the whole input in a minimal document when there is no head.
pub fn inject_base_tag(html: &str, base_href: &str) -> String {
    let base = format!(r#"<base href="{base_href}">"#);
    match HEAD_OPEN_REGEX.find(html) {
        Some(head) => {
            let mut out = String::with_capacity(html.len() + base.len());
            out.push_str(&html[..head.end()]);
            out.push_str(&base);
            out.push_str(&html[head.end()..]);
            out
        },
        None => skeleton(&base, html),
    }
}

/// Insert a `<style>` block right before the first closing head tag, or wrap
/// the whole input in a minimal document when there is no head.
pub fn wrap_with_extra_css(html: &str, css: &str) -> String {
    let style = format!("<style>\n{css}\n</style>");
    if let Some(close) = HEAD_CLOSE_REGEX.find(html) {
        let mut out = String::with_capacity(html.len() + style.len());
        out.push_str(&html[..close.start()]);
        out.push_str(&style);
        out.push_str(&html[close.start()..]);
        return out;
    }
    if HEAD_OPEN_REGEX.is_match(html) {
        tracing::warn!("Extra stylesheet not injected; closing head tag not found");
        return html.to_string();
    }
    skeleton(&style, html)
}

/// The `file://` URL of a directory, always ending in a slash so that it
/// works as a `<base href>`.
pub fn base_href(dir: impl AsRef<Path>) -> Result<String> {
    let dir = dir.as_ref();
    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let url = Url::from_directory_path(&absolute)
        .ok()
        .ok_or_raise(|| ErrorKind::InvalidInput(format!("not a usable base directory: {}", dir.display())))?;
    Ok(url.to_string())
}
