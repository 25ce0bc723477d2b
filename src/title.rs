/// Page title cleanup: badge counters, whitespace and trailing site names
use regex::Regex;
use std::sync::LazyLock;

static COUNTER_BADGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d+\)\s*").expect("valid counter regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Trailing " · Site", " | Site" and " - Site" segments, stripped in this order.
static SITE_SUFFIX_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"\s+[·•]\s+[^·•]+$").expect("valid dot separator regex"),
        Regex::new(r"\s+\|\s+[^|]+$").expect("valid pipe separator regex"),
        Regex::new(r"\s+[-–—]\s+[^-–—]+$").expect("valid dash separator regex"),
    ]
});

/// Strip a leading unread counter like "(119) ", collapse whitespace runs and trim.
pub fn normalize_title(title: &str) -> String {
    let without_badge = COUNTER_BADGE_RE.replace(title, "");
    WHITESPACE_RE
        .replace_all(&without_badge, " ")
        .trim()
        .to_string()
}

/// Remove the trailing site-name part of a title.
///
/// Separator-delimited suffixes go first, then a trailing word matching `site_label`
/// (case-insensitive, must be preceded by whitespace).
pub fn strip_trailing_site_part(title: &str, site_label: &str) -> String {
    let mut stripped = title.to_string();
    for re in SITE_SUFFIX_RES.iter() {
        stripped = re.replace(&stripped, "").into_owned();
    }

    if !site_label.is_empty() {
        let pattern = format!(r"(?i)\s+{}\s*$", regex::escape(site_label));
        if let Ok(re) = Regex::new(&pattern) {
            stripped = re.replace(&stripped, "").into_owned();
        }
    }

    stripped.trim().to_string()
}
