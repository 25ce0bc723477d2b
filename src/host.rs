/// Capabilities the engine needs from the browser
use crate::settings::Settings;
use crate::tab_data::{Group, GroupId, GroupUpdate, Tab, TabId, WindowId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("tab {0} no longer exists")]
    TabGone(TabId),
    #[error("{op} rejected: {reason}")]
    Rejected { op: &'static str, reason: String },
    #[error("failed to decode browser data: {0}")]
    Decode(String),
}

/// Browser tab, group, messaging and storage APIs.
///
/// All calls may suspend; none of them block other event delivery. Implementations run on a
/// single-threaded event loop, so the futures are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// Tabs of the last focused window, ordered by index.
    async fn focused_window_tabs(&self) -> Result<Vec<Tab>, HostError>;

    /// Tabs of a window, ordered by index.
    async fn window_tabs(&self, window_id: WindowId) -> Result<Vec<Tab>, HostError>;

    /// Every tab in every window.
    async fn all_tabs(&self) -> Result<Vec<Tab>, HostError>;

    async fn window_groups(&self, window_id: WindowId) -> Result<Vec<Group>, HostError>;

    /// Move tabs, in the given order, to a contiguous block starting at `index`.
    async fn move_tabs(&self, tab_ids: &[TabId], index: usize) -> Result<(), HostError>;

    /// Put tabs into `existing` when given, otherwise into a new group; returns the group id.
    async fn group_tabs(
        &self,
        tab_ids: &[TabId],
        existing: Option<GroupId>,
    ) -> Result<GroupId, HostError>;

    async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<(), HostError>;

    async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    /// Ask the tab's content script to show `title`.
    async fn apply_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError>;

    /// Ask the tab's content script to put the page's own title back.
    async fn restore_title(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn load_settings(&self) -> Result<Settings, HostError>;

    /// Resolve after `ms` milliseconds.
    async fn sleep(&self, ms: u32);

    /// Milliseconds since the epoch.
    fn now_ms(&self) -> f64;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::tab_data::{GroupColor, GROUP_NONE};
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};

    /// Mutation calls recorded by [`FakeHost`]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Move(Vec<TabId>, usize),
        Group(Vec<TabId>, Option<GroupId>),
        Ungroup(Vec<TabId>),
        UpdateGroup(GroupId, GroupUpdate),
        Close(Vec<TabId>),
    }

    impl Call {
        /// Calls that reorder or regroup tabs, as opposed to metadata refreshes.
        pub fn is_structural(&self) -> bool {
            matches!(self, Call::Move(..) | Call::Group(..) | Call::Ungroup(..))
        }
    }

    #[derive(Debug, Default)]
    struct Browser {
        tabs: Vec<Tab>,
        groups: Vec<Group>,
        next_group_id: GroupId,
    }

    impl Browser {
        fn reindex(&mut self, window_id: WindowId) {
            let mut ids: Vec<(i32, TabId)> = self
                .tabs
                .iter()
                .filter(|t| t.window_id == window_id)
                .map(|t| (t.index, t.id))
                .collect();
            ids.sort();
            for (position, (_, id)) in ids.into_iter().enumerate() {
                if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
                    tab.index = position as i32;
                }
            }
        }

        fn prune_groups(&mut self) {
            let used: HashSet<GroupId> = self.tabs.iter().map(|t| t.group_id).collect();
            self.groups.retain(|g| used.contains(&g.id));
        }
    }

    /// In-memory browser with a virtual clock
    pub struct FakeHost {
        browser: RefCell<Browser>,
        pub settings: RefCell<Settings>,
        pub calls: RefCell<Vec<Call>>,
        pub titles: RefCell<HashMap<TabId, String>>,
        pub restored: RefCell<Vec<TabId>>,
        pub unreachable: RefCell<HashSet<TabId>>,
        pub focused_window: Cell<WindowId>,
        clock: Cell<f64>,
    }

    impl FakeHost {
        pub fn new(tabs: Vec<Tab>) -> Self {
            let focused = tabs.first().map(|t| t.window_id).unwrap_or(1);
            FakeHost {
                browser: RefCell::new(Browser {
                    tabs,
                    groups: Vec::new(),
                    next_group_id: 100,
                }),
                settings: RefCell::new(Settings::new()),
                calls: RefCell::new(Vec::new()),
                titles: RefCell::new(HashMap::new()),
                restored: RefCell::new(Vec::new()),
                unreachable: RefCell::new(HashSet::new()),
                focused_window: Cell::new(focused),
                clock: Cell::new(0.0),
            }
        }

        pub fn with_group(
            self,
            id: GroupId,
            title: &str,
            color: GroupColor,
            window_id: WindowId,
        ) -> Self {
            self.browser.borrow_mut().groups.push(Group {
                id,
                title: title.to_string(),
                color: Some(color),
                collapsed: false,
                window_id,
            });
            self
        }

        pub fn tabs(&self) -> Vec<Tab> {
            let mut tabs = self.browser.borrow().tabs.clone();
            tabs.sort_by_key(|t| (t.window_id, t.index));
            tabs
        }

        pub fn groups(&self) -> Vec<Group> {
            self.browser.borrow().groups.clone()
        }

        pub fn structural_calls(&self) -> Vec<Call> {
            self.calls.borrow().iter().filter(|c| c.is_structural()).cloned().collect()
        }

        pub fn clear_calls(&self) {
            self.calls.borrow_mut().clear();
        }

        pub fn advance(&self, ms: f64) {
            self.clock.set(self.clock.get() + ms);
        }

        /// Simulate the user opening a tab at the end of a window.
        pub fn open_tab(&self, mut tab: Tab) {
            let mut browser = self.browser.borrow_mut();
            tab.index = browser.tabs.iter().filter(|t| t.window_id == tab.window_id).count() as i32;
            browser.tabs.push(tab);
        }

        fn query(&self, window_id: Option<WindowId>) -> Vec<Tab> {
            self.tabs()
                .into_iter()
                .filter(|t| window_id.is_none_or(|w| t.window_id == w))
                .collect()
        }
    }

    impl TabHost for FakeHost {
        async fn focused_window_tabs(&self) -> Result<Vec<Tab>, HostError> {
            Ok(self.query(Some(self.focused_window.get())))
        }

        async fn window_tabs(&self, window_id: WindowId) -> Result<Vec<Tab>, HostError> {
            Ok(self.query(Some(window_id)))
        }

        async fn all_tabs(&self) -> Result<Vec<Tab>, HostError> {
            Ok(self.query(None))
        }

        async fn window_groups(&self, window_id: WindowId) -> Result<Vec<Group>, HostError> {
            Ok(self
                .groups()
                .into_iter()
                .filter(|g| g.window_id == window_id)
                .collect())
        }

        async fn move_tabs(&self, tab_ids: &[TabId], index: usize) -> Result<(), HostError> {
            self.calls.borrow_mut().push(Call::Move(tab_ids.to_vec(), index));
            let mut browser = self.browser.borrow_mut();
            let Some(window_id) = browser
                .tabs
                .iter()
                .find(|t| tab_ids.contains(&t.id))
                .map(|t| t.window_id)
            else {
                return Err(HostError::TabGone(tab_ids.first().copied().unwrap_or_default()));
            };

            let mut order: Vec<TabId> = browser
                .tabs
                .iter()
                .filter(|t| t.window_id == window_id && !tab_ids.contains(&t.id))
                .map(|t| (t.index, t.id))
                .collect::<std::collections::BTreeMap<_, _>>()
                .into_values()
                .collect();
            let at = index.min(order.len());
            order.splice(at..at, tab_ids.iter().copied());

            for (position, id) in order.into_iter().enumerate() {
                if let Some(tab) = browser.tabs.iter_mut().find(|t| t.id == id) {
                    tab.index = position as i32;
                }
            }
            Ok(())
        }

        async fn group_tabs(
            &self,
            tab_ids: &[TabId],
            existing: Option<GroupId>,
        ) -> Result<GroupId, HostError> {
            self.calls.borrow_mut().push(Call::Group(tab_ids.to_vec(), existing));
            let mut browser = self.browser.borrow_mut();
            let window_id = browser
                .tabs
                .iter()
                .find(|t| tab_ids.contains(&t.id))
                .map(|t| t.window_id)
                .ok_or(HostError::Rejected {
                    op: "group",
                    reason: "no such tabs".to_string(),
                })?;

            let group_id = match existing {
                Some(id) => id,
                None => {
                    let id = browser.next_group_id;
                    browser.next_group_id += 1;
                    browser.groups.push(Group {
                        id,
                        title: String::new(),
                        color: None,
                        collapsed: false,
                        window_id,
                    });
                    id
                }
            };
            for tab in browser.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
                tab.group_id = group_id;
            }
            browser.prune_groups();
            Ok(group_id)
        }

        async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
            self.calls.borrow_mut().push(Call::Ungroup(tab_ids.to_vec()));
            let mut browser = self.browser.borrow_mut();
            for tab in browser.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
                tab.group_id = GROUP_NONE;
            }
            browser.prune_groups();
            Ok(())
        }

        async fn update_group(
            &self,
            group_id: GroupId,
            update: &GroupUpdate,
        ) -> Result<(), HostError> {
            self.calls
                .borrow_mut()
                .push(Call::UpdateGroup(group_id, update.clone()));
            let mut browser = self.browser.borrow_mut();
            let group = browser
                .groups
                .iter_mut()
                .find(|g| g.id == group_id)
                .ok_or(HostError::Rejected {
                    op: "update group",
                    reason: format!("no group {group_id}"),
                })?;
            if let Some(title) = &update.title {
                group.title = title.clone();
            }
            if let Some(color) = update.color {
                group.color = Some(color);
            }
            if let Some(collapsed) = update.collapsed {
                group.collapsed = collapsed;
            }
            Ok(())
        }

        async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
            self.calls.borrow_mut().push(Call::Close(tab_ids.to_vec()));
            let mut browser = self.browser.borrow_mut();
            let windows: HashSet<WindowId> = browser.tabs.iter().map(|t| t.window_id).collect();
            browser.tabs.retain(|t| !tab_ids.contains(&t.id));
            for window_id in windows {
                browser.reindex(window_id);
            }
            browser.prune_groups();
            Ok(())
        }

        async fn apply_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError> {
            let exists = self.browser.borrow().tabs.iter().any(|t| t.id == tab_id);
            if !exists || self.unreachable.borrow().contains(&tab_id) {
                return Err(HostError::TabGone(tab_id));
            }
            self.titles.borrow_mut().insert(tab_id, title.to_string());
            Ok(())
        }

        async fn restore_title(&self, tab_id: TabId) -> Result<(), HostError> {
            if self.unreachable.borrow().contains(&tab_id) {
                return Err(HostError::TabGone(tab_id));
            }
            self.titles.borrow_mut().remove(&tab_id);
            self.restored.borrow_mut().push(tab_id);
            Ok(())
        }

        async fn load_settings(&self) -> Result<Settings, HostError> {
            Ok(self.settings.borrow().clone())
        }

        async fn sleep(&self, ms: u32) {
            self.advance(f64::from(ms));
        }

        fn now_ms(&self) -> f64 {
            self.clock.get()
        }
    }
}
