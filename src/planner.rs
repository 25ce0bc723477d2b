/// Convergence of the live tab/group arrangement towards one cluster per domain
///
/// Every pass first decides whether the window already looks the way it should. Only when it
/// does not are tabs ungrouped, moved and regrouped, because each of those mutations animates
/// in the tab strip.
use crate::domain::{domain_label, grouping_key, host_of, is_renamable_url};
use crate::host::{HostError, TabHost};
use crate::scheduler::MutationGuard;
use crate::scope::partition_by;
use crate::settings::Settings;
use crate::tab_data::{
    GROUP_NONE, Group, GroupColor, GroupId, GroupUpdate, Tab, TabId, WindowId,
};
use std::collections::HashMap;

/// Result of one arrange/group step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Convergence {
    /// Arranging and grouping are both switched off.
    #[default]
    Disabled,
    /// Another mutation was in flight; nothing was done.
    Busy,
    /// The window already matched; at most group metadata was refreshed.
    Stable,
    /// Tabs were moved and/or regrouped.
    Rebuilt,
    /// A host query failed before anything could be decided.
    Failed,
}

/// Tabs of one grouping key, in window order
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    pub key: String,
    pub tabs: Vec<&'a Tab>,
}

impl Cluster<'_> {
    pub fn label(&self) -> String {
        domain_label(&self.key)
    }

    fn wants_group(&self, settings: &Settings) -> bool {
        self.tabs.len() >= settings.min_group_size()
    }

    /// The single real group all members share, if there is one.
    fn shared_group(&self) -> Option<GroupId> {
        let first = self.tabs.first()?.group_id;
        (first != GROUP_NONE && self.tabs.iter().all(|t| t.group_id == first)).then_some(first)
    }
}

/// Tabs the engine may arrange: not pinned and not an internal page.
pub fn is_arrangeable(tab: &Tab) -> bool {
    !tab.pinned && is_renamable_url(&tab.url)
}

/// Partition arrangeable tabs by grouping key, keeping first-seen order.
pub fn clusters(tabs: &[Tab]) -> Vec<Cluster<'_>> {
    let mut ordered: Vec<&Tab> = tabs.iter().filter(|t| is_arrangeable(t)).collect();
    ordered.sort_by_key(|t| t.index);

    partition_by(ordered, |tab| grouping_key(&host_of(&tab.url)))
        .into_iter()
        .map(|(key, tabs)| Cluster { key, tabs })
        .collect()
}

/// Whether live groups already match the desired ones.
///
/// Every cluster that wants a group must sit in one shared group titled with its domain
/// label; every other cluster must be entirely ungrouped. Colors are not compared.
pub fn groups_match(clusters: &[Cluster<'_>], groups: &[Group], settings: &Settings) -> bool {
    let by_id: HashMap<GroupId, &Group> = groups.iter().map(|g| (g.id, g)).collect();

    clusters.iter().all(|cluster| {
        if !cluster.wants_group(settings) {
            return cluster.tabs.iter().all(|t| !t.is_grouped());
        }
        cluster
            .shared_group()
            .and_then(|gid| by_id.get(&gid))
            .is_some_and(|group| group.title == cluster.label())
    })
}

/// Eligible tab ids sorted by (cluster anchor, own index).
///
/// A cluster's anchor is the smallest index among its tabs, so existing clusters stay where
/// they are and new arrivals are pulled next to them.
pub fn arranged_order(clusters: &[Cluster<'_>]) -> Vec<TabId> {
    let mut items: Vec<(i32, i32, TabId)> = clusters
        .iter()
        .flat_map(|cluster| {
            let anchor = cluster.tabs.iter().map(|t| t.index).min().unwrap_or(0);
            cluster.tabs.iter().map(move |t| (anchor, t.index, t.id))
        })
        .collect();
    items.sort_by_key(|&(anchor, index, _)| (anchor, index));
    items.into_iter().map(|(_, _, id)| id).collect()
}

/// Whether eligible tabs already form one block, in arranged order, right after the pinned tabs.
pub fn order_matches(tabs: &[Tab], clusters: &[Cluster<'_>]) -> bool {
    let pinned = tabs.iter().filter(|t| t.pinned).count();
    let index_of: HashMap<TabId, i32> = tabs.iter().map(|t| (t.id, t.index)).collect();

    arranged_order(clusters)
        .iter()
        .enumerate()
        .all(|(offset, id)| index_of.get(id) == Some(&((pinned + offset) as i32)))
}

/// Metadata refresh for groups that are already correct: only groups whose title or color
/// drifted are touched.
pub fn stable_refreshes(
    clusters: &[Cluster<'_>],
    groups: &[Group],
    settings: &Settings,
) -> Vec<(GroupId, GroupUpdate)> {
    clusters
        .iter()
        .filter(|cluster| cluster.wants_group(settings))
        .filter_map(|cluster| {
            let gid = cluster.shared_group()?;
            let color = GroupColor::for_key(&cluster.key);
            let label = cluster.label();
            let current = groups.iter().find(|g| g.id == gid);
            let up_to_date =
                current.is_some_and(|g| g.title == label && g.color == Some(color));
            (!up_to_date).then(|| (gid, GroupUpdate::labelled(label, color)))
        })
        .collect()
}

/// Decision of the domain-arrangement planner
#[derive(Debug, Clone, PartialEq)]
pub enum ChromePlan {
    Stable {
        refresh: Vec<(GroupId, GroupUpdate)>,
    },
    Rebuild {
        /// Grouped tabs to release before regrouping.
        ungroup: Vec<TabId>,
        /// Tab order to move into place, with the target index; `None` when arranging is off.
        arrange: Option<(Vec<TabId>, usize)>,
    },
}

pub fn plan_chrome(tabs: &[Tab], groups: &[Group], settings: &Settings) -> ChromePlan {
    let clusters = clusters(tabs);

    let stable = if settings.auto_group {
        groups_match(&clusters, groups, settings)
    } else {
        order_matches(tabs, &clusters)
    };
    if stable {
        return ChromePlan::Stable {
            refresh: if settings.auto_group {
                stable_refreshes(&clusters, groups, settings)
            } else {
                Vec::new()
            },
        };
    }

    let ungroup = if settings.auto_group && settings.ungroup_before_grouping {
        tabs.iter()
            .filter(|t| is_arrangeable(t) && t.is_grouped())
            .map(|t| t.id)
            .collect()
    } else {
        Vec::new()
    };

    let arrange = settings.auto_arrange.then(|| {
        let pinned = tabs.iter().filter(|t| t.pinned).count();
        (arranged_order(&clusters), pinned)
    });

    ChromePlan::Rebuild { ungroup, arrange }
}

/// One real group to create after the tabs were moved
#[derive(Debug, Clone, PartialEq)]
pub struct RegroupTarget {
    pub key: String,
    pub tab_ids: Vec<TabId>,
    /// Existing group holding only this cluster's tabs, reused instead of creating one.
    pub reuse: Option<GroupId>,
}

pub fn regroup_targets(tabs: &[Tab], settings: &Settings) -> Vec<RegroupTarget> {
    let clusters = clusters(tabs);
    // A group is reusable only when every tab in it belongs to `key`
    let owned_by = |gid: GroupId, key: &str| {
        let mut keys = clusters
            .iter()
            .filter(|c| c.tabs.iter().any(|t| t.group_id == gid))
            .map(|c| c.key.as_str());
        let foreign_member = tabs.iter().any(|t| t.group_id == gid && !is_arrangeable(t));
        keys.next() == Some(key) && keys.next().is_none() && !foreign_member
    };

    clusters
        .iter()
        .filter(|cluster| cluster.wants_group(settings))
        .map(|cluster| {
            let reuse = cluster
                .tabs
                .iter()
                .map(|t| t.group_id)
                .find(|&gid| gid != GROUP_NONE && owned_by(gid, &cluster.key));
            RegroupTarget {
                key: cluster.key.clone(),
                tab_ids: cluster.tabs.iter().map(|t| t.id).collect(),
                reuse,
            }
        })
        .collect()
}

/// Group/ungroup step of the native-group mode
#[derive(Debug, Clone, PartialEq)]
pub enum NativeAction {
    Ungroup(Vec<TabId>),
    Group {
        tab_ids: Vec<TabId>,
        existing: Option<GroupId>,
    },
}

/// Pull same-domain tabs into one group without reordering anything.
pub fn plan_native(tabs: &[Tab], settings: &Settings) -> Vec<NativeAction> {
    clusters(tabs)
        .iter()
        .filter_map(|cluster| {
            if !cluster.wants_group(settings) {
                let grouped: Vec<TabId> = cluster
                    .tabs
                    .iter()
                    .filter(|t| t.is_grouped())
                    .map(|t| t.id)
                    .collect();
                return (!grouped.is_empty()).then_some(NativeAction::Ungroup(grouped));
            }
            if cluster.shared_group().is_some() {
                return None;
            }
            Some(NativeAction::Group {
                tab_ids: cluster.tabs.iter().map(|t| t.id).collect(),
                existing: cluster.tabs.iter().map(|t| t.group_id).find(|&g| g != GROUP_NONE),
            })
        })
        .collect()
}

/// Run the domain-arrangement step for one window.
///
/// Dropped when another mutation holds the guard. The guard is released with a cooldown.
pub async fn arrange_and_group<H: TabHost>(
    host: &H,
    guard: &MutationGuard,
    window_id: WindowId,
    settings: &Settings,
) -> Convergence {
    if !settings.auto_arrange && !settings.auto_group {
        return Convergence::Disabled;
    }
    if !guard.try_acquire(host.now_ms()) {
        log::debug!("Arrange skipped: mutation in progress");
        return Convergence::Busy;
    }

    let outcome = match converge_chrome(host, window_id, settings).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("Arrange of window {} failed: {}", window_id, e);
            Convergence::Failed
        }
    };

    guard.release(host.now_ms());
    outcome
}

async fn converge_chrome<H: TabHost>(
    host: &H,
    window_id: WindowId,
    settings: &Settings,
) -> Result<Convergence, HostError> {
    let tabs = host.window_tabs(window_id).await?;
    let groups = if settings.auto_group {
        host.window_groups(window_id).await?
    } else {
        Vec::new()
    };

    let (ungroup, arrange) = match plan_chrome(&tabs, &groups, settings) {
        ChromePlan::Stable { refresh } => {
            log::debug!(
                "Window {} already arranged, {} group(s) to refresh",
                window_id,
                refresh.len()
            );
            for (gid, update) in &refresh {
                if let Err(e) = host.update_group(*gid, update).await {
                    log::warn!("Refreshing group {} failed: {}", gid, e);
                }
            }
            return Ok(Convergence::Stable);
        }
        ChromePlan::Rebuild { ungroup, arrange } => (ungroup, arrange),
    };

    if !ungroup.is_empty() {
        log::info!("Ungrouping {} tab(s) before regrouping", ungroup.len());
        if let Err(e) = host.ungroup_tabs(&ungroup).await {
            log::warn!("Ungroup failed: {}", e);
        }
    }

    if let Some((order, index)) = arrange.filter(|(order, _)| !order.is_empty()) {
        log::info!("Moving {} tab(s) to index {}", order.len(), index);
        if let Err(e) = host.move_tabs(&order, index).await {
            log::warn!("Move failed: {}", e);
        }
    }

    if settings.auto_group {
        let after = host.window_tabs(window_id).await?;
        for target in regroup_targets(&after, settings) {
            let group_id = match host.group_tabs(&target.tab_ids, target.reuse).await {
                Ok(id) => id,
                Err(e) => {
                    log::warn!("Grouping {} failed: {}", target.key, e);
                    continue;
                }
            };
            let update = GroupUpdate::labelled(
                domain_label(&target.key),
                GroupColor::for_key(&target.key),
            );
            if let Err(e) = host.update_group(group_id, &update).await {
                log::warn!("Labelling group {} failed: {}", group_id, e);
            }
        }
    }

    Ok(Convergence::Rebuilt)
}

/// Run the native-group step for one window.
pub async fn group_similar<H: TabHost>(
    host: &H,
    guard: &MutationGuard,
    window_id: WindowId,
    settings: &Settings,
) -> Convergence {
    if !settings.auto_group {
        return Convergence::Disabled;
    }
    if !guard.try_acquire(host.now_ms()) {
        log::debug!("Grouping skipped: mutation in progress");
        return Convergence::Busy;
    }

    let outcome = match host.window_tabs(window_id).await {
        Ok(tabs) => {
            let actions = plan_native(&tabs, settings);
            if actions.is_empty() {
                Convergence::Stable
            } else {
                for action in &actions {
                    let result = match action {
                        NativeAction::Ungroup(ids) => host.ungroup_tabs(ids).await,
                        NativeAction::Group { tab_ids, existing } => {
                            host.group_tabs(tab_ids, *existing).await.map(|_| ())
                        }
                    };
                    if let Err(e) = result {
                        log::warn!("Native grouping step failed: {}", e);
                    }
                }
                Convergence::Rebuilt
            }
        }
        Err(e) => {
            log::warn!("Listing tabs of window {} failed: {}", window_id, e);
            Convergence::Failed
        }
    };

    guard.release(host.now_ms());
    outcome
}
