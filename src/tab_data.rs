/// Snapshots of browser tabs and tab groups, plus the commands derived from them
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type GroupId = i32;
pub type WindowId = i32;

/// Group id the browser reports for tabs outside any group.
pub const GROUP_NONE: GroupId = -1;

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    pub window_id: WindowId,
    #[serde(default = "ungrouped")]
    pub group_id: GroupId,
    #[serde(default)]
    pub index: i32,
}

fn ungrouped() -> GroupId {
    GROUP_NONE
}

impl Tab {
    pub fn new(id: TabId, url: &str, title: &str, window_id: WindowId, index: i32) -> Tab {
        Tab {
            id,
            url: url.to_string(),
            title: title.to_string(),
            pinned: false,
            window_id,
            group_id: GROUP_NONE,
            index,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id != GROUP_NONE
    }
}

/// Colors the browser accepts for tab groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    pub const PALETTE: [GroupColor; 9] = [
        GroupColor::Grey,
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Yellow,
        GroupColor::Green,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Cyan,
        GroupColor::Orange,
    ];

    /// Deterministic palette pick for a grouping key.
    pub fn for_key(key: &str) -> GroupColor {
        let hash = key
            .encode_utf16()
            .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
        Self::PALETTE[hash as usize % Self::PALETTE.len()]
    }
}

/// Information about a tab group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub title: String,
    pub color: Option<GroupColor>,
    #[serde(default)]
    pub collapsed: bool,
    pub window_id: WindowId,
}

/// Title/color change for an existing group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<GroupColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl GroupUpdate {
    pub fn labelled(title: String, color: GroupColor) -> GroupUpdate {
        GroupUpdate {
            title: Some(title),
            color: Some(color),
            collapsed: None,
        }
    }
}

/// A pending visible-title change for one tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleOp {
    pub tab_id: TabId,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_creation() {
        let tab = Tab::new(1, "https://google.com", "Google", 7, 0);

        assert_eq!(tab.id, 1);
        assert_eq!(tab.url, "https://google.com");
        assert_eq!(tab.title, "Google");
        assert!(!tab.pinned);
        assert_eq!(tab.window_id, 7);
        assert!(!tab.is_grouped());
    }

    #[test]
    fn test_tab_deserializes_browser_shape() {
        let json = r#"{
            "id": 12, "url": "https://github.com/rust-lang/rust", "title": "rust-lang/rust",
            "pinned": false, "windowId": 3, "groupId": 44, "index": 5,
            "active": true, "favIconUrl": "https://github.com/favicon.ico"
        }"#;
        let tab: Tab = serde_json::from_str(json).unwrap();

        assert_eq!(tab.id, 12);
        assert_eq!(tab.window_id, 3);
        assert_eq!(tab.group_id, 44);
        assert!(tab.is_grouped());
    }

    #[test]
    fn test_tab_defaults_missing_fields() {
        let tab: Tab = serde_json::from_str(r#"{"id": 1, "windowId": 2}"#).unwrap();

        assert_eq!(tab.url, "");
        assert_eq!(tab.group_id, GROUP_NONE);
        assert_eq!(tab.index, 0);
    }

    #[test]
    fn test_group_color_is_deterministic() {
        assert_eq!(GroupColor::for_key("github.com"), GroupColor::for_key("github.com"));
        // "ab" hashes to 97 * 31 + 98 = 3105, and 3105 % 9 == 0
        assert_eq!(GroupColor::for_key("ab"), GroupColor::Grey);
        assert_eq!(GroupColor::for_key(""), GroupColor::Grey);
    }

    #[test]
    fn test_group_update_serialization() {
        let update = GroupUpdate::labelled("Github".to_string(), GroupColor::Purple);
        let json = serde_json::to_string(&update).unwrap();

        assert_eq!(json, r#"{"title":"Github","color":"purple"}"#);
    }
}
