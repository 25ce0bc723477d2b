/// Recompute orchestration: settings → arrange/group → per-scope titles → apply
use crate::host::{HostError, TabHost};
use crate::planner::{arrange_and_group, group_similar, Convergence};
use crate::scheduler::{Begin, Scheduler, Ticket, DEBOUNCE_MS};
use crate::scope::title_ops;
use crate::settings::{ChangeReaction, Mode, SettingsChange};
use crate::tab_data::{GroupId, GroupUpdate, TabId, TitleOp, WindowId};
use futures_util::future::join_all;

/// Summary of one recompute or restore sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub convergence: Convergence,
    pub applied: usize,
    pub failed: usize,
}

/// Owns the host and the scheduling state shared by every pass
pub struct Engine<H: TabHost> {
    host: H,
    scheduler: Scheduler,
}

impl<H: TabHost> Engine<H> {
    pub fn new(host: H) -> Self {
        Engine {
            host,
            scheduler: Scheduler::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Register a tab/group event. The caller drives the returned ticket with [`Engine::run`].
    pub fn schedule(&self) -> Ticket {
        self.scheduler.request()
    }

    /// Wait out the debounce period, then run passes until no rerun is pending.
    ///
    /// Returns without doing anything when a newer trigger superseded `ticket`.
    pub async fn run(&self, ticket: Ticket) -> Option<PassReport> {
        let mut ticket = ticket;
        let mut last = None;
        let mut delay = f64::from(DEBOUNCE_MS);

        loop {
            self.host.sleep(delay.ceil() as u32).await;
            match self.scheduler.begin(ticket, self.host.now_ms()) {
                Begin::Stale => return last,
                Begin::Wait(ms) => {
                    log::debug!("Recompute waits {}ms for mutation cooldown", ms);
                    delay = ms;
                    continue;
                }
                Begin::Run => {}
            }

            let report = self.recompute().await;
            // `begin` waits out the guard, so this only fires when a holder outside the
            // scheduler takes it between `begin` and the arrange step.
            if report.convergence == Convergence::Busy {
                self.scheduler.mark_pending();
            }
            last = Some(report);

            match self.scheduler.finish() {
                Some(next) => {
                    ticket = next;
                    delay = f64::from(DEBOUNCE_MS);
                }
                None => return last,
            }
        }
    }

    /// One full pass over the focused window.
    pub async fn recompute(&self) -> PassReport {
        let settings = match self.host.load_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Loading settings failed: {}", e);
                return PassReport::default();
            }
        };
        if !settings.enabled {
            return PassReport::default();
        }

        let window_id = match self.host.focused_window_tabs().await {
            Ok(tabs) => tabs.first().map(|t| t.window_id),
            Err(e) => {
                log::warn!("Listing focused window failed: {}", e);
                None
            }
        };
        let Some(window_id) = window_id else {
            return PassReport::default();
        };

        let guard = self.scheduler.guard();
        let convergence = match settings.mode {
            Mode::Chrome => arrange_and_group(&self.host, guard, window_id, &settings).await,
            Mode::NativeGroups => group_similar(&self.host, guard, window_id, &settings).await,
        };

        let tabs = match self.host.focused_window_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                log::warn!("Listing focused window failed: {}", e);
                return PassReport {
                    convergence,
                    ..PassReport::default()
                };
            }
        };

        let ops = title_ops(&tabs, &settings);
        log::debug!("Applying {} title(s) in window {}", ops.len(), window_id);
        let (applied, failed) = self.apply_titles(&ops).await;

        PassReport {
            convergence,
            applied,
            failed,
        }
    }

    /// Send every title independently; failures are counted, never propagated.
    async fn apply_titles(&self, ops: &[TitleOp]) -> (usize, usize) {
        let results = join_all(
            ops.iter()
                .map(|op| self.host.apply_title(op.tab_id, &op.title)),
        )
        .await;
        tally(results)
    }

    /// Put the page's own title back in every tab of every window.
    pub async fn restore_all(&self) -> PassReport {
        let tabs = match self.host.all_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                log::warn!("Listing tabs for restore failed: {}", e);
                return PassReport::default();
            }
        };

        log::info!("Restoring original titles in {} tab(s)", tabs.len());
        let results = join_all(tabs.iter().map(|t| self.host.restore_title(t.id))).await;
        let (applied, failed) = tally(results);
        PassReport {
            applied,
            failed,
            ..PassReport::default()
        }
    }

    /// React to a storage change; returns a ticket when a recompute should be driven.
    pub async fn settings_changed(&self, change: &SettingsChange, area: &str) -> Option<Ticket> {
        match change.reaction(area) {
            ChangeReaction::Ignore => None,
            ChangeReaction::Restore => {
                self.restore_all().await;
                None
            }
            ChangeReaction::Recompute => Some(self.schedule()),
        }
    }

    /// Close every tab of a group.
    pub async fn close_group(
        &self,
        window_id: WindowId,
        group_id: GroupId,
    ) -> Result<usize, HostError> {
        let ids: Vec<TabId> = self
            .host
            .window_tabs(window_id)
            .await?
            .iter()
            .filter(|t| t.group_id == group_id)
            .map(|t| t.id)
            .collect();
        if !ids.is_empty() {
            self.host.close_tabs(&ids).await?;
        }
        Ok(ids.len())
    }

    /// Flip a group between collapsed and expanded; returns the new state.
    pub async fn toggle_group_collapsed(
        &self,
        window_id: WindowId,
        group_id: GroupId,
    ) -> Result<bool, HostError> {
        let group = self
            .host
            .window_groups(window_id)
            .await?
            .into_iter()
            .find(|g| g.id == group_id)
            .ok_or(HostError::Rejected {
                op: "toggle collapse",
                reason: format!("no group {group_id} in window {window_id}"),
            })?;

        let update = GroupUpdate {
            title: None,
            color: None,
            collapsed: Some(!group.collapsed),
        };
        self.host.update_group(group_id, &update).await?;
        Ok(!group.collapsed)
    }
}

fn tally(results: Vec<Result<(), HostError>>) -> (usize, usize) {
    results.into_iter().fold((0, 0), |(ok, failed), result| match result {
        Ok(()) => (ok + 1, failed),
        Err(e) => {
            log::debug!("Title command not delivered: {}", e);
            (ok, failed + 1)
        }
    })
}
