/// Domain classification: hosts, registrable domains and grouping keys
use url::Url;

/// Two-label public suffixes under which registrations happen one level deeper.
///
/// This is a small built-in set, not the full public suffix list.
const MULTIPART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "gov.uk", "ac.uk", "me.uk", "ltd.uk", "plc.uk", "net.uk", "sch.uk", "com.au",
    "net.au", "org.au", "edu.au", "gov.au", "co.nz", "org.nz", "govt.nz", "co.jp", "ne.jp", "or.jp",
    "ac.jp", "co.kr", "or.kr", "co.in", "net.in", "org.in", "com.br", "com.mx", "com.ar", "com.cn",
    "com.tw", "com.hk", "com.sg", "com.tr", "co.za", "co.il", "com.ua",
];

/// Grouping key used for tabs whose URL has no host.
pub const UNKNOWN_KEY: &str = "unknown";

/// Extract the lowercase hostname (without port) from a URL.
///
/// Malformed URLs and URLs without a host (`file:`, `about:`) yield an empty string.
pub fn host_of(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default()
}

/// Whether the extension may touch a tab showing this URL.
pub fn is_renamable_url(url: &str) -> bool {
    !url.is_empty() && !url.starts_with("chrome://") && !url.starts_with("edge://")
}

/// Reduce a host to its registrable domain
///
/// Algorithm:
/// 1. Split the host by "."
/// 2. With two labels or fewer, the host already is the registrable domain
/// 3. If the last two labels form a known multi-part suffix ("co.uk", "com.au"):
///    → Return last 3 labels (e.g., "bbc.co.uk")
/// 4. Else:
///    → Return last 2 labels (e.g., "microsoft.com")
///
/// `localhost` and IP literals are returned unchanged.
pub fn registrable_domain(host: &str) -> String {
    if host == "localhost" || is_ip_address(host) {
        return host.to_string();
    }

    let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
    if parts.len() <= 2 {
        return host.to_string();
    }

    let last2 = parts[parts.len() - 2..].join(".");
    if MULTIPART_SUFFIXES.contains(&last2.as_str()) {
        parts[parts.len() - 3..].join(".")
    } else {
        last2
    }
}

/// The key tabs are clustered by.
///
/// Normally the registrable domain, except that `google.com` services keep their own host
/// so Mail, Drive and Docs form separate clusters.
pub fn grouping_key(host: &str) -> String {
    if host.is_empty() {
        return UNKNOWN_KEY.to_string();
    }

    let reg = registrable_domain(host);
    if reg == "google.com" {
        return host.strip_prefix("www.").unwrap_or(host).to_string();
    }
    reg
}

/// Human label for a registrable domain: first label, capitalized.
pub fn domain_label(reg_dom: &str) -> String {
    match reg_dom.split('.').next().filter(|first| !first.is_empty()) {
        Some(first) => capitalize(first),
        None => "Site".to_string(),
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Check if a string looks like an IP address
fn is_ip_address(s: &str) -> bool {
    // IPv6 hosts keep their brackets in `host_str`
    if s.starts_with('[') {
        return true;
    }
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}
