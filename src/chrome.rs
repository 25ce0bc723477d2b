/// `TabHost` backed by the chrome.* extension APIs through `chrome_bridge.js`
use crate::host::{HostError, TabHost};
use crate::settings::Settings;
use crate::tab_data::{Group, GroupId, GroupUpdate, Tab, TabId, WindowId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/chrome_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryFocusedWindowTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryWindowTabs(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryAllTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryGroups(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn moveTabs(tab_ids: JsValue, index: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn groupTabs(tab_ids: JsValue, group_id: Option<i32>) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn ungroupTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateGroup(group_id: i32, update: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn closeTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn applyTitle(tab_id: i32, title: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn restoreTitle(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn loadSettings() -> Result<JsValue, JsValue>;

    async fn sleep(ms: u32);
}

/// The live browser
#[derive(Debug, Default)]
pub struct ChromeHost;

impl ChromeHost {
    pub fn new() -> Self {
        ChromeHost
    }
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Decode(e.to_string()))
}

fn encode<T: Serialize + ?Sized>(op: &'static str, value: &T) -> Result<JsValue, HostError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| HostError::Rejected {
        op,
        reason: e.to_string(),
    })
}

fn rejected(op: &'static str) -> impl Fn(JsValue) -> HostError {
    move |e| HostError::Rejected {
        op,
        reason: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
    }
}

impl TabHost for ChromeHost {
    async fn focused_window_tabs(&self) -> Result<Vec<Tab>, HostError> {
        decode(queryFocusedWindowTabs().await.map_err(rejected("query tabs"))?)
    }

    async fn window_tabs(&self, window_id: WindowId) -> Result<Vec<Tab>, HostError> {
        decode(queryWindowTabs(window_id).await.map_err(rejected("query tabs"))?)
    }

    async fn all_tabs(&self) -> Result<Vec<Tab>, HostError> {
        decode(queryAllTabs().await.map_err(rejected("query tabs"))?)
    }

    async fn window_groups(&self, window_id: WindowId) -> Result<Vec<Group>, HostError> {
        decode(queryGroups(window_id).await.map_err(rejected("query groups"))?)
    }

    async fn move_tabs(&self, tab_ids: &[TabId], index: usize) -> Result<(), HostError> {
        let ids = encode("move", tab_ids)?;
        let index = u32::try_from(index).map_err(|_| HostError::Rejected {
            op: "move",
            reason: format!("index {index} out of range"),
        })?;
        moveTabs(ids, index).await.map_err(rejected("move"))
    }

    async fn group_tabs(
        &self,
        tab_ids: &[TabId],
        existing: Option<GroupId>,
    ) -> Result<GroupId, HostError> {
        let ids = encode("group", tab_ids)?;
        decode(groupTabs(ids, existing).await.map_err(rejected("group"))?)
    }

    async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        let ids = encode("ungroup", tab_ids)?;
        ungroupTabs(ids).await.map_err(rejected("ungroup"))
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<(), HostError> {
        let update = encode("update group", update)?;
        updateGroup(group_id, update).await.map_err(rejected("update group"))
    }

    async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        let ids = encode("close", tab_ids)?;
        closeTabs(ids).await.map_err(rejected("close"))
    }

    async fn apply_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError> {
        // The content script is missing on tabs that were never loaded since install
        applyTitle(tab_id, title).await.map_err(|_| HostError::TabGone(tab_id))
    }

    async fn restore_title(&self, tab_id: TabId) -> Result<(), HostError> {
        restoreTitle(tab_id).await.map_err(|_| HostError::TabGone(tab_id))
    }

    async fn load_settings(&self) -> Result<Settings, HostError> {
        let stored = loadSettings().await.map_err(rejected("load settings"))?;
        if stored.is_null() || stored.is_undefined() {
            return Ok(Settings::new());
        }
        decode(stored)
    }

    async fn sleep(&self, ms: u32) {
        sleep(ms).await;
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
