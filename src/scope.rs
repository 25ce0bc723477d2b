/// Rename scopes and the titles derived inside them
use crate::domain::{
    capitalize, domain_label, grouping_key, host_of, is_renamable_url, registrable_domain,
};
use crate::extract::one_word_label;
use crate::settings::{Mode, Settings};
use crate::tab_data::{GroupId, Tab, TitleOp};
use crate::unique::shortest_unique_one_word;
use std::collections::HashMap;
use std::hash::Hash;

/// The set of tabs within which labels must be unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Window,
    Group(GroupId),
    Ungrouped,
}

impl ScopeKey {
    /// Native-group mode keeps labels unique per group; Chrome mode already clustered the
    /// whole window by domain, so the window is one scope.
    pub fn for_tab(mode: Mode, tab: &Tab) -> ScopeKey {
        match mode {
            Mode::Chrome => ScopeKey::Window,
            Mode::NativeGroups if tab.is_grouped() => ScopeKey::Group(tab.group_id),
            Mode::NativeGroups => ScopeKey::Ungrouped,
        }
    }
}

/// Split items into buckets by key, keeping first-seen key order and item order.
pub fn partition_by<T, K, F>(
    items: impl IntoIterator<Item = T>,
    mut key_of: F,
) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let key = key_of(&item);
        match slots.get(&key) {
            Some(&slot) => buckets[slot].1.push(item),
            None => {
                slots.insert(key.clone(), buckets.len());
                buckets.push((key, vec![item]));
            }
        }
    }
    buckets
}

/// One configured exclusion, read as a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    /// Grouping key of the entry, so a subdomain entry covers its whole cluster.
    pub key: String,
    pub host: String,
}

impl Exclusion {
    pub fn matches(&self, key: &str, host: &str) -> bool {
        self.key == key || self.host == host
    }
}

pub fn exclusions(settings: &Settings) -> Vec<Exclusion> {
    settings
        .excluded_hosts
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .map(|entry| Exclusion {
            key: grouping_key(&host_of(&format!("https://{entry}"))),
            host: entry,
        })
        .collect()
}

/// Compute the visible title of every renamable tab.
///
/// Pinned tabs, internal pages, host-less URLs and excluded domains are left alone. A domain
/// with one tab in its scope is titled after the domain; otherwise every tab gets a short
/// unique word.
pub fn title_ops(tabs: &[Tab], settings: &Settings) -> Vec<TitleOp> {
    let excluded = exclusions(settings);

    let eligible = tabs.iter().filter_map(|tab| {
        if tab.pinned || !is_renamable_url(&tab.url) {
            return None;
        }
        let host = host_of(&tab.url);
        if host.is_empty() {
            return None;
        }
        let key = grouping_key(&host);
        if excluded.iter().any(|e| e.matches(&key, &host)) {
            return None;
        }
        Some((tab, host, key))
    });

    let mut ops = Vec::new();
    let scopes = partition_by(eligible, |(tab, _, _)| ScopeKey::for_tab(settings.mode, tab));
    for (_, scope_tabs) in scopes {
        for (key, mut members) in partition_by(scope_tabs, |(_, _, key)| key.clone()) {
            members.sort_by_key(|(tab, _, _)| tab.index);
            ops.extend(domain_title_ops(&key, &members));
        }
    }
    ops
}

fn domain_title_ops(key: &str, members: &[(&Tab, String, String)]) -> Vec<TitleOp> {
    if let [(tab, _, _)] = members {
        return vec![TitleOp {
            tab_id: tab.id,
            title: domain_label(key),
        }];
    }

    let reg_dom = members
        .first()
        .map(|(_, host, _)| registrable_domain(host))
        .filter(|reg| !reg.is_empty())
        .unwrap_or_else(|| key.to_string());

    let candidates: Vec<String> = members
        .iter()
        .map(|(tab, host, _)| one_word_label(tab, &reg_dom, host))
        .collect();

    shortest_unique_one_word(&candidates)
        .into_iter()
        .zip(members)
        .map(|(word, (tab, _, _))| TitleOp {
            tab_id: tab.id,
            title: capitalize(&word),
        })
        .collect()
}
