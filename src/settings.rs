/// User settings as stored in chrome.storage.sync
use serde::{Deserialize, Serialize};

/// How tabs get arranged before they are renamed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Reorder tabs by domain and build one real group per domain.
    #[default]
    #[serde(rename = "CHROME")]
    Chrome,
    /// Only pull same-domain tabs into a shared group, never reorder.
    #[serde(rename = "DIA", alias = "NATIVE")]
    NativeGroups,
}

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    #[serde(rename = "browserMode")]
    pub mode: Mode,
    pub auto_arrange: bool,
    pub auto_group: bool,
    pub group_min_tabs: usize,
    pub ungroup_before_grouping: bool,
    pub excluded_hosts: Vec<String>,
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            enabled: true,
            mode: Mode::Chrome,
            auto_arrange: true,
            auto_group: true,
            group_min_tabs: 2,
            ungroup_before_grouping: true,
            excluded_hosts: Vec::new(),
        }
    }

    /// Minimum member count for a real group; never below one.
    pub fn min_group_size(&self) -> usize {
        self.group_min_tabs.max(1)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// One changed key from a storage change notification
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange<T> {
    pub new_value: Option<T>,
}

/// Payload of a storage change notification
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SettingsChange {
    #[serde(default)]
    pub enabled: Option<ValueChange<bool>>,
}

/// What a settings change asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReaction {
    Ignore,
    Restore,
    Recompute,
}

impl SettingsChange {
    /// Only the `sync` area holds settings; disabling restores every original title.
    pub fn reaction(&self, area: &str) -> ChangeReaction {
        if area != "sync" {
            return ChangeReaction::Ignore;
        }
        match &self.enabled {
            Some(change) if change.new_value != Some(true) => ChangeReaction::Restore,
            _ => ChangeReaction::Recompute,
        }
    }
}
