// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};

/// Work card links: `.../cards/<author_id>/card<title_id>.html`.
static CARD_LINK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)cards/([0-9]+)/card([0-9]+)\.html(?:[?#].*)?$").ok()
});

/// Match a work card link and capture `(author_id, title_id)`.
///
/// # Examples
/// ```
/// use collector::utils::url::match_card_link;
///
/// assert_eq!(
///     match_card_link("https://site/cards/000035/card12345.html"),
///     Some(("000035".to_string(), "12345".to_string()))
/// );
/// assert_eq!(match_card_link("https://site/cards/35/index.html"), None);
/// ```
pub fn match_card_link(href: &str) -> Option<(String, String)> {
    let caps = CARD_LINK.as_ref()?.captures(href.trim())?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// Canonical detail page location for a work.
pub fn card_url(site_base: &str, author_id: &str, title_id: &str) -> String {
    format!(
        "{}/cards/{}/card{}.html",
        site_base.trim_end_matches('/'),
        author_id,
        title_id
    )
}

/// Whether a link already names a full network location.
pub fn is_absolute_link(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join `href` onto the directory of `base`.
///
/// Absolute links pass through unchanged. Anything else is treated as a
/// path under the base page's directory: `dir + "/" + href`, with `.` and
/// `..` segments cleaned. The result never climbs above the site root, and
/// the base page's own query and fragment are dropped.
pub fn join_on_directory(base: &str, href: &str) -> Result<String> {
    let href = href.trim();
    if is_absolute_link(href) {
        return Ok(href.to_string());
    }

    let mut url = Url::parse(base)?;
    if let Some(rest) = href.strip_prefix("//") {
        return Ok(Url::parse(&format!("{}://{}", url.scheme(), rest))?.to_string());
    }
    if url.cannot_be_a_base() {
        return Err(AppError::validation(format!(
            "cannot resolve {href} against {base}"
        )));
    }

    let (path_part, fragment) = split_once_opt(href, '#');
    let (path_part, query) = split_once_opt(path_part, '?');

    let dir = parent_dir(url.path());
    let joined = clean_path(&format!("{dir}/{path_part}"));

    url.set_path(&joined);
    url.set_query(query);
    url.set_fragment(fragment);
    Ok(url.to_string())
}

fn split_once_opt(s: &str, sep: char) -> (&str, Option<&str>) {
    match s.split_once(sep) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

/// Directory component of a URL path (`/a/b/c.html` -> `/a/b`).
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "",
        Some(idx) => &path[..idx],
    }
}

/// Lexically clean an absolute slash-separated path.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}
