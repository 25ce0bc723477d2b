/// Word tokenization for label candidates
use regex::Regex;
use std::sync::LazyLock;

/// Words that never describe a page on their own.
const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "to", "of", "in", "on", "for", "with", "at", "from", "a", "an", "is",
    "are", "was", "were", "home", "dashboard", "page", "tab", "new", "login", "sign", "signin",
    "signup", "settings", "account", "accounts", "watch", "video", "channel",
];

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid non-word regex"));

static NON_LATIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Hebrew}\p{Arabic}\p{Han}\p{Hiragana}\p{Katakana}\p{Cyrillic}]")
        .expect("valid script regex")
});

/// Split text into candidate label words, in order of appearance.
///
/// Drops words shorter than 3 characters, stop words and pure numbers.
pub fn tokenize_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace(['\'', '’'], "");
    let spaced = NON_WORD_RE.replace_all(&lowered, " ");

    spaced
        .split(' ')
        .filter(|w| w.len() >= 3)
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// First surviving word of `text`, if any.
pub fn first_word(text: &str) -> Option<String> {
    tokenize_words(text).into_iter().next()
}

/// Whether the text uses a script the ASCII tokenizer cannot split into words.
pub fn is_non_latin_title(title: &str) -> bool {
    NON_LATIN_RE.is_match(title)
}
