/// Collision resolution for one-word tab labels
use std::collections::{HashMap, HashSet};

/// Longest prefix tried when shortening a label.
const MAX_PREFIX_LEN: usize = 12;

const FALLBACK_LABEL: &str = "tab";

/// Make labels unique while keeping them as short as possible.
///
/// The output has the same length and order as the input. Three passes, each only when the
/// previous one still has duplicates:
/// 1. lowercase (empty → "tab")
/// 2. shortest prefix no other label starts with, capped at 12 characters
/// 3. number repeated values in input order: "repo", "repo2", "repo3"
pub fn shortest_unique_one_word(labels: &[String]) -> Vec<String> {
    let lower: Vec<String> = labels
        .iter()
        .map(|label| {
            if label.is_empty() {
                FALLBACK_LABEL.to_string()
            } else {
                label.to_lowercase()
            }
        })
        .collect();

    if all_unique(&lower) {
        return lower;
    }

    let prefixes: Vec<String> = lower
        .iter()
        .enumerate()
        .map(|(i, word)| shortest_distinct_prefix(i, word, &lower))
        .collect();

    if all_unique(&prefixes) {
        return prefixes;
    }

    number_duplicates(prefixes)
}

fn all_unique(words: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(words.len());
    words.iter().all(|w| seen.insert(w.as_str()))
}

fn shortest_distinct_prefix(index: usize, word: &str, all: &[String]) -> String {
    let chars: Vec<char> = word.chars().collect();
    let limit = chars.len().min(MAX_PREFIX_LEN);

    (1..=limit)
        .map(|len| chars[..len].iter().collect::<String>())
        .find(|prefix| {
            all.iter()
                .enumerate()
                .all(|(j, other)| j == index || !other.starts_with(prefix.as_str()))
        })
        .unwrap_or_else(|| chars[..limit].iter().collect())
}

fn number_duplicates(words: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = words.iter().cloned().collect();
    let mut seen: HashMap<String, u32> = HashMap::new();

    words
        .into_iter()
        .map(|word| {
            let count = seen.entry(word.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return word;
            }

            let mut n = *count;
            let mut candidate = format!("{word}{n}");
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{word}{n}");
            }
            *count = n;
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}
