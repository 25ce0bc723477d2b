/// Per-site rules for picking the one word that describes a tab
use crate::domain::domain_label;
use crate::tab_data::Tab;
use crate::title::{normalize_title, strip_trailing_site_part};
use crate::tokenize::{first_word, is_non_latin_title};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Path segments that look like content ids rather than words.
static OPAQUE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_-]{6,}$").expect("valid opaque id regex"));

const MAX_SEGMENT_LEN: usize = 24;

/// Which extraction rule applies to a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Mail,
    CodeHost,
    VideoHost,
    Generic,
}

impl SiteKind {
    pub fn classify(host: &str) -> SiteKind {
        if is_host_or_subdomain(host, "mail.google.com") {
            SiteKind::Mail
        } else if is_host_or_subdomain(host, "github.com") {
            SiteKind::CodeHost
        } else if is_host_or_subdomain(host, "youtube.com") {
            SiteKind::VideoHost
        } else {
            SiteKind::Generic
        }
    }
}

fn is_host_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
}

/// Derive a lowercase one-word label for a tab.
///
/// `reg_dom` is the registrable domain of the tab's cluster and `host` the tab's own host.
pub fn one_word_label(tab: &Tab, reg_dom: &str, host: &str) -> String {
    let title = normalize_title(&tab.title);

    match SiteKind::classify(host) {
        SiteKind::Mail => mail_word(&tab.url),
        SiteKind::CodeHost => code_host_word(&tab.url, &title),
        SiteKind::VideoHost => video_host_word(&tab.url, &title),
        SiteKind::Generic => generic_word(&tab.url, &title, reg_dom),
    }
}

fn mail_word(url: &str) -> String {
    let label = mail_label_from_url(url);
    first_word(&label).unwrap_or_else(|| {
        if label.is_empty() {
            "inbox".to_string()
        } else {
            label.to_lowercase()
        }
    })
}

/// The folder, label or category named in a webmail URL fragment.
fn mail_label_from_url(url: &str) -> String {
    let Some(fragment) = Url::parse(url).ok().and_then(|u| u.fragment().map(str::to_string))
    else {
        return String::new();
    };

    let simple = fragment.split(['?', '&']).next().unwrap_or_default();
    if simple.is_empty() {
        return String::new();
    }

    if let Some(label) = simple.strip_prefix("label/") {
        return first_segment_or(&percent_decode(label), "label");
    }
    if let Some(category) = simple.strip_prefix("category/") {
        return first_segment_or(&percent_decode(category), "cat");
    }
    if simple.starts_with("search/") {
        return "search".to_string();
    }
    percent_decode(simple.split('/').next().unwrap_or_default())
}

fn first_segment_or(path: &str, fallback: &str) -> String {
    match path.split('/').next() {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => fallback.to_string(),
    }
}

fn code_host_word(url: &str, title: &str) -> String {
    let repo = path_segments(url).into_iter().nth(1).unwrap_or_default();
    if !repo.is_empty() {
        return repo.to_lowercase();
    }
    first_word(&strip_trailing_site_part(title, "GitHub")).unwrap_or_else(|| "github".to_string())
}

fn video_host_word(url: &str, title: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let path = parsed.path();

    if path.starts_with("/watch") {
        return "watch".to_string();
    }
    if path.starts_with("/shorts") {
        return "shorts".to_string();
    }
    if path.starts_with("/results") {
        return "search".to_string();
    }
    if path.starts_with("/channel/") {
        return "channel".to_string();
    }
    if let Some(handle) = path.strip_prefix("/@") {
        let handle = handle.split('/').next().unwrap_or_default();
        return if handle.is_empty() {
            "channel".to_string()
        } else {
            handle.to_lowercase()
        };
    }

    first_word(&strip_trailing_site_part(title, "YouTube"))
        .or_else(|| meaningful_path_segment(url))
        .unwrap_or_else(|| "youtube".to_string())
}

fn generic_word(url: &str, title: &str, reg_dom: &str) -> String {
    let label = domain_label(reg_dom);
    let stripped = strip_trailing_site_part(title, &label);

    // Non-Latin titles tokenize into nothing useful; the URL is a better source
    let from_title = if is_non_latin_title(&stripped) {
        None
    } else {
        first_word(&stripped)
    };

    from_title
        .or_else(|| meaningful_path_segment(url))
        .unwrap_or_else(|| {
            let lowered = label.to_lowercase();
            if lowered.is_empty() { "tab".to_string() } else { lowered }
        })
}

/// Pick the most descriptive path segment of a URL, walking from the end.
///
/// Segments longer than 24 characters or shaped like ids ("XvJJ_29RJpE", "ABC123") are
/// skipped. The first word of the chosen segment is returned if it has at least 2 characters.
pub fn meaningful_path_segment(url: &str) -> Option<String> {
    path_segments(url).iter().rev().find_map(|segment| {
        if segment.chars().count() > MAX_SEGMENT_LEN || OPAQUE_ID_RE.is_match(segment) {
            return None;
        }
        let lowered = segment.to_lowercase().replace(['-', '_'], " ");
        let word = lowered.trim().split(' ').next().unwrap_or_default();
        (word.chars().count() >= 2).then(|| word.to_string())
    })
}

/// Non-empty, percent-decoded path segments of a URL.
fn path_segments(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(percent_decode)
                .collect()
        })
        .unwrap_or_default()
}

/// Decode `%XX` escapes; malformed input is returned unchanged.
fn percent_decode(segment: &str) -> String {
    url_decode(segment).unwrap_or_else(|| segment.to_string())
}

fn url_decode(input: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() != 2 {
                return None;
            }
            bytes.push(u8::from_str_radix(&hex, 16).ok()?);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8(bytes).ok()
}
