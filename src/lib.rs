/// Tab Labeler - Chrome extension that gives every tab a short, unique title
/// Built with Rust + WASM

mod domain;
mod engine;
mod extract;
mod host;
mod planner;
mod scheduler;
mod scope;
mod settings;
mod tab_data;
mod title;
mod tokenize;
mod unique;

#[cfg(target_arch = "wasm32")]
mod chrome;

pub use engine::{Engine, PassReport};
pub use host::{HostError, TabHost};
pub use planner::Convergence;
pub use settings::{Mode, Settings, SettingsChange};
pub use tab_data::{Group, GroupColor, GroupUpdate, Tab};

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use crate::chrome::ChromeHost;
    use crate::engine::Engine;
    use crate::settings::SettingsChange;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    /// Runtime message a content script sends when the page retitles itself.
    const PAGE_TITLE_CHANGED: &str = "PAGE_TITLE_CHANGED";

    thread_local! {
        static ENGINE: Rc<Engine<ChromeHost>> = Rc::new(Engine::new(ChromeHost::new()));
    }

    fn engine() -> Rc<Engine<ChromeHost>> {
        ENGINE.with(Rc::clone)
    }

    // Set up panic hook for better error messages in the browser console
    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::default());
    }

    /// Any tab or group event: debounce, then recompute the focused window.
    #[wasm_bindgen]
    pub fn schedule_recompute() {
        let engine = engine();
        let ticket = engine.schedule();
        spawn_local(async move {
            if let Some(report) = engine.run(ticket).await {
                log::debug!("Pass finished: {:?}", report);
            }
        });
    }

    #[wasm_bindgen]
    pub fn on_tab_updated(title_changed: bool, load_complete: bool) {
        if title_changed || load_complete {
            schedule_recompute();
        }
    }

    #[wasm_bindgen]
    pub fn on_runtime_message(kind: &str) {
        if kind == PAGE_TITLE_CHANGED {
            schedule_recompute();
        }
    }

    #[wasm_bindgen]
    pub fn on_settings_changed(changes: JsValue, area: String) {
        let change: SettingsChange = serde_wasm_bindgen::from_value(changes).unwrap_or_else(|e| {
            log::warn!("Unreadable settings change: {}", e);
            SettingsChange::default()
        });
        let engine = engine();
        spawn_local(async move {
            if let Some(ticket) = engine.settings_changed(&change, &area).await {
                engine.run(ticket).await;
            }
        });
    }

    /// Put back every page's own title, in every window.
    #[wasm_bindgen]
    pub async fn restore_all_titles() -> usize {
        engine().restore_all().await.applied
    }

    /// Close all tabs of a group; resolves to the number of tabs closed.
    #[wasm_bindgen]
    pub async fn close_group(window_id: i32, group_id: i32) -> Result<usize, JsValue> {
        engine()
            .close_group(window_id, group_id)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Resolves to the group's new collapsed state.
    #[wasm_bindgen]
    pub async fn toggle_group_collapsed(window_id: i32, group_id: i32) -> Result<bool, JsValue> {
        engine()
            .toggle_group_collapsed(window_id, group_id)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // Re-export core domain functions for JavaScript access
    #[wasm_bindgen]
    pub fn grouping_key(url: &str) -> String {
        crate::domain::grouping_key(&crate::domain::host_of(url))
    }
}
