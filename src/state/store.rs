// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known state of every node, with optimistic patches.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::event::{EventBus, StoreEvent};

use super::{DeviceRecord, NodeRecord};

type DeviceKey = (String, String);

#[derive(Debug, Default)]
struct StoreInner {
    nodes: HashMap<String, NodeRecord>,
    generation: u64,
    stale: bool,
    /// Generation at which each optimistically patched device was patched.
    pending: HashMap<DeviceKey, u64>,
    /// Start generation of the newest committed poll.
    committed: u64,
    last_success: Option<DateTime<Utc>>,
}

impl StoreInner {
    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// Holds the last-known record of every node and device.
///
/// Polls swap the whole node map; commands patch exactly one
/// `(node, device)` pair. Every mutation bumps a generation counter so a
/// poll that started before a patch cannot silently undo it when it
/// commits (see [`reconcile`](Self::reconcile)).
///
/// Reads return clones; no reference into the store outlives the lock.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use livhub_lib::state::{DeviceRecord, NodeRecord, StateStore};
///
/// let store = StateStore::new();
/// store.replace_all([NodeRecord::new("n1", "Patio", true, Utc::now())
///     .with_device(DeviceRecord::new("LIV Hub"))]);
///
/// let previous = store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));
/// assert!(previous.is_some());
/// assert!(store.device("n1", "LIV Hub").unwrap().power());
///
/// store.revert("n1", "LIV Hub", previous.unwrap());
/// assert!(!store.device("n1", "LIV Hub").unwrap().power());
/// ```
#[derive(Debug)]
pub struct StateStore {
    inner: RwLock<StoreInner>,
    events: EventBus,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_bus(EventBus::new())
    }

    /// Creates an empty store publishing to the given bus.
    #[must_use]
    pub fn with_event_bus(events: EventBus) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            events,
        }
    }

    /// Subscribes to store events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the current generation.
    ///
    /// A poll records this value before fetching and passes it to
    /// [`reconcile`](Self::reconcile).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Swaps in a new set of nodes, discarding every optimistic patch.
    ///
    /// Nodes absent from `records` are removed. Clears the stale flag.
    pub fn replace_all(&self, records: impl IntoIterator<Item = NodeRecord>) {
        let nodes: HashMap<String, NodeRecord> = records
            .into_iter()
            .map(|node| (node.id().to_string(), node))
            .collect();

        let event = {
            let mut inner = self.inner.write();
            inner.nodes = nodes;
            inner.pending.clear();
            inner.stale = false;
            inner.last_success = Some(Utc::now());
            let generation = inner.bump();
            inner.committed = generation;
            StoreEvent::Replaced {
                generation,
                nodes: inner.nodes.len(),
                kept_optimistic: 0,
            }
        };

        self.events.publish(event);
    }

    /// Commits the result of a poll that started at generation `started`.
    ///
    /// Works like [`replace_all`](Self::replace_all), except that a device
    /// patched after `started` keeps its local record: the poll's data for
    /// it predates the patch. Its status is re-derived from the freshly
    /// polled connectivity. The patch stays pending until a poll that
    /// started after it commits.
    ///
    /// A poll that started before the newest committed poll (or the last
    /// [`replace_all`](Self::replace_all)) is refused and the store is left
    /// untouched.
    ///
    /// Returns the number of devices whose patch was kept, or `None` if the
    /// poll was refused.
    pub fn reconcile(
        &self,
        started: u64,
        records: impl IntoIterator<Item = NodeRecord>,
    ) -> Option<usize> {
        let mut nodes: HashMap<String, NodeRecord> = records
            .into_iter()
            .map(|node| (node.id().to_string(), node))
            .collect();

        let (event, kept) = {
            let mut inner = self.inner.write();
            if started < inner.committed {
                tracing::debug!(
                    started,
                    committed = inner.committed,
                    "Refusing poll older than the last commit"
                );
                return None;
            }

            let pending = std::mem::take(&mut inner.pending);
            let mut still_pending = HashMap::new();

            for ((node_id, device_name), patched_at) in pending {
                if patched_at <= started {
                    continue;
                }
                let Some(mut local) = inner
                    .nodes
                    .get(&node_id)
                    .and_then(|node| node.device(&device_name))
                    .cloned()
                else {
                    continue;
                };
                let Some(fresh_node) = nodes.get_mut(&node_id) else {
                    continue;
                };
                if fresh_node.device(&device_name).is_none() {
                    continue;
                }

                local.refresh_status(fresh_node.online());
                fresh_node.insert_device(local);
                tracing::debug!(
                    node_id = %node_id,
                    device = %device_name,
                    patched_at,
                    started,
                    "Keeping optimistic record over older poll data"
                );
                still_pending.insert((node_id, device_name), patched_at);
            }

            let kept = still_pending.len();
            inner.nodes = nodes;
            inner.pending = still_pending;
            inner.committed = started;
            inner.stale = false;
            inner.last_success = Some(Utc::now());
            let event = StoreEvent::Replaced {
                generation: inner.bump(),
                nodes: inner.nodes.len(),
                kept_optimistic: kept,
            };
            (event, kept)
        };

        self.events.publish(event);
        Some(kept)
    }

    /// Marks the store stale after a failed poll.
    ///
    /// Records are kept as they were.
    pub fn mark_stale(&self, reason: impl Into<String>) {
        self.inner.write().stale = true;
        self.events.publish(StoreEvent::UpdateFailed {
            reason: reason.into(),
        });
    }

    /// Returns whether the last poll failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.inner.read().stale
    }

    /// Returns when a poll last committed.
    #[must_use]
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_success
    }

    /// Returns a node by id.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<NodeRecord> {
        self.inner.read().nodes.get(node_id).cloned()
    }

    /// Returns a device by node id and name.
    #[must_use]
    pub fn device(&self, node_id: &str, device_name: &str) -> Option<DeviceRecord> {
        self.inner
            .read()
            .nodes
            .get(node_id)
            .and_then(|node| node.device(device_name))
            .cloned()
    }

    /// Returns every node, ordered by id.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeRecord> {
        let mut nodes: Vec<NodeRecord> = self.inner.read().nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        nodes
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Returns whether the store holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    /// Returns whether a node is online. Unknown nodes are offline.
    #[must_use]
    pub fn is_online(&self, node_id: &str) -> bool {
        self.inner
            .read()
            .nodes
            .get(node_id)
            .is_some_and(NodeRecord::online)
    }

    /// Returns whether a node's entities should be shown as available.
    ///
    /// True when the last poll succeeded and the node is online.
    #[must_use]
    pub fn is_available(&self, node_id: &str) -> bool {
        let inner = self.inner.read();
        !inner.stale && inner.nodes.get(node_id).is_some_and(NodeRecord::online)
    }

    /// Returns whether a device has an optimistic patch not yet confirmed
    /// by a poll.
    #[must_use]
    pub fn is_pending(&self, node_id: &str, device_name: &str) -> bool {
        self.inner
            .read()
            .pending
            .contains_key(&(node_id.to_string(), device_name.to_string()))
    }

    /// Patches one device in place.
    ///
    /// Status is re-derived after `mutate` runs. Returns a snapshot of the
    /// device taken before the patch, for [`revert`](Self::revert). Returns
    /// `None` without calling `mutate` or publishing anything if the device
    /// is unknown.
    pub fn apply_optimistic<F>(
        &self,
        node_id: &str,
        device_name: &str,
        mutate: F,
    ) -> Option<DeviceRecord>
    where
        F: FnOnce(&mut DeviceRecord),
    {
        let previous = {
            let mut inner = self.inner.write();
            let node = inner.nodes.get_mut(node_id)?;
            let online = node.online();
            let device = node.device_mut(device_name)?;

            let previous = device.clone();
            mutate(device);
            device.refresh_status(online);

            let generation = inner.bump();
            inner
                .pending
                .insert((node_id.to_string(), device_name.to_string()), generation);
            previous
        };

        tracing::debug!(node_id, device = device_name, "Applied optimistic update");
        self.events
            .publish(StoreEvent::device_updated(node_id, device_name));
        Some(previous)
    }

    /// Restores a device to a snapshot returned by
    /// [`apply_optimistic`](Self::apply_optimistic).
    ///
    /// Returns `false` if the device is no longer in the store.
    pub fn revert(&self, node_id: &str, device_name: &str, previous: DeviceRecord) -> bool {
        {
            let mut inner = self.inner.write();
            let Some(node) = inner.nodes.get_mut(node_id) else {
                return false;
            };
            let online = node.online();
            let Some(device) = node.device_mut(device_name) else {
                return false;
            };

            *device = previous;
            device.refresh_status(online);
            inner
                .pending
                .remove(&(node_id.to_string(), device_name.to_string()));
            inner.bump();
        }

        tracing::debug!(node_id, device = device_name, "Reverted optimistic update");
        self.events
            .publish(StoreEvent::device_reverted(node_id, device_name));
        true
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BrightnessPct, Hue, SystemStatus};

    fn device(name: &str, power: bool, refill: f64) -> DeviceRecord {
        let mut device = DeviceRecord::new(name);
        device.set_power(power);
        device.set_led_color(Hue::new(200).unwrap(), BrightnessPct::new(60).unwrap());
        device.set_refill_life(refill);
        device.set_codes(3, 0);
        device.refresh_status(true);
        device
    }

    fn node(id: &str, online: bool, devices: Vec<DeviceRecord>) -> NodeRecord {
        devices.into_iter().fold(
            NodeRecord::new(id, format!("Node {id}"), online, Utc::now()),
            NodeRecord::with_device,
        )
    }

    fn populated() -> StateStore {
        let store = StateStore::new();
        store.replace_all([
            node(
                "n1",
                true,
                vec![device("LIV Hub", false, 80.0), device("Aux", false, 40.0)],
            ),
            node("n2", true, vec![device("LIV Hub", false, 20.0)]),
        ]);
        store
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[test]
    fn empty_store() {
        let store = StateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
        assert!(store.node("n1").is_none());
        assert!(!store.is_online("n1"));
        assert!(!store.is_available("n1"));
        assert!(store.last_success().is_none());
    }

    #[test]
    fn replace_all_swaps_nodes() {
        let store = populated();
        assert_eq!(store.len(), 2);
        assert!(store.last_success().is_some());

        store.replace_all([node("n3", false, vec![device("LIV Hub", true, 10.0)])]);
        assert_eq!(store.len(), 1);
        assert!(store.node("n1").is_none());
        assert!(!store.is_online("n3"));
    }

    #[test]
    fn nodes_sorted_by_id() {
        let store = populated();
        let ids: Vec<String> = store.nodes().iter().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[test]
    fn stale_store_keeps_records_but_is_unavailable() {
        let store = populated();
        store.mark_stale("no nodes found");

        assert!(store.is_stale());
        assert_eq!(store.len(), 2);
        assert!(store.is_online("n1"));
        assert!(!store.is_available("n1"));

        store.replace_all(store.nodes());
        assert!(!store.is_stale());
        assert!(store.is_available("n1"));
    }

    // =========================================================================
    // Optimistic updates
    // =========================================================================

    #[test]
    fn optimistic_update_touches_only_target() {
        let store = populated();
        let before_aux = store.device("n1", "Aux").unwrap();
        let before_n2 = store.device("n2", "LIV Hub").unwrap();
        let before_n1_meta = store.node("n1").unwrap();

        let previous = store
            .apply_optimistic("n1", "LIV Hub", |d| d.set_power(true))
            .unwrap();
        assert!(!previous.power());

        let patched = store.device("n1", "LIV Hub").unwrap();
        assert!(patched.power());
        assert!(patched.led_power());
        assert_eq!(patched.system_status(), SystemStatus::Protected);

        assert_eq!(store.device("n1", "Aux").unwrap(), before_aux);
        assert_eq!(store.device("n2", "LIV Hub").unwrap(), before_n2);
        let after_n1_meta = store.node("n1").unwrap();
        assert_eq!(after_n1_meta.name(), before_n1_meta.name());
        assert_eq!(after_n1_meta.last_poll(), before_n1_meta.last_poll());
    }

    #[test]
    fn optimistic_update_rederives_status() {
        let store = populated();
        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));
        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(false));
        assert_eq!(
            store.device("n1", "LIV Hub").unwrap().system_status(),
            SystemStatus::Off
        );
    }

    #[tokio::test]
    async fn unknown_device_is_not_mutated_or_announced() {
        let store = populated();
        let mut rx = store.subscribe();
        let generation = store.generation();

        let mut called = false;
        assert!(
            store
                .apply_optimistic("n1", "Missing", |_| called = true)
                .is_none()
        );
        assert!(
            store
                .apply_optimistic("n9", "LIV Hub", |_| called = true)
                .is_none()
        );

        assert!(!called);
        assert_eq!(store.generation(), generation);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn revert_restores_snapshot_and_notifies_twice() {
        let store = populated();
        let mut rx = store.subscribe();
        let original = store.device("n1", "LIV Hub").unwrap();

        let previous = store
            .apply_optimistic("n1", "LIV Hub", |d| {
                d.set_power(true);
                d.set_refill_life(100.0);
            })
            .unwrap();
        assert!(store.is_pending("n1", "LIV Hub"));

        assert!(store.revert("n1", "LIV Hub", previous));
        assert_eq!(store.device("n1", "LIV Hub").unwrap(), original);
        assert!(!store.is_pending("n1", "LIV Hub"));

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::device_updated("n1", "LIV Hub")
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::device_reverted("n1", "LIV Hub")
        );
    }

    #[test]
    fn revert_of_vanished_device_is_ignored() {
        let store = populated();
        let previous = store
            .apply_optimistic("n1", "LIV Hub", |d| d.set_power(true))
            .unwrap();
        store.replace_all([node("n2", true, vec![device("LIV Hub", false, 20.0)])]);

        assert!(!store.revert("n1", "LIV Hub", previous));
        assert!(store.node("n1").is_none());
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    #[test]
    fn older_poll_keeps_optimistic_record() {
        let store = populated();
        let started = store.generation();

        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));

        // Poll fetched before the patch and reports the old power state,
        // with a changed refill on the untouched device.
        let kept = store.reconcile(
            started,
            [
                node(
                    "n1",
                    true,
                    vec![device("LIV Hub", false, 79.0), device("Aux", false, 39.0)],
                ),
                node("n2", true, vec![device("LIV Hub", false, 19.0)]),
            ],
        );

        assert_eq!(kept, Some(1));
        assert!(store.device("n1", "LIV Hub").unwrap().power());
        assert!((store.device("n1", "Aux").unwrap().refill_life() - 39.0).abs() < f64::EPSILON);
        assert!(store.is_pending("n1", "LIV Hub"));
    }

    #[test]
    fn kept_record_follows_fresh_connectivity() {
        let store = populated();
        let started = store.generation();
        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));

        store.reconcile(
            started,
            [node("n1", false, vec![device("LIV Hub", false, 80.0)])],
        );

        let device = store.device("n1", "LIV Hub").unwrap();
        assert!(device.power());
        assert_eq!(device.system_status(), SystemStatus::NotConnected);
    }

    #[test]
    fn newer_poll_confirms_and_clears_pending() {
        let store = populated();
        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));
        let started = store.generation();

        let kept = store.reconcile(
            started,
            [node("n1", true, vec![device("LIV Hub", false, 80.0)])],
        );

        assert_eq!(kept, Some(0));
        assert!(!store.device("n1", "LIV Hub").unwrap().power());
        assert!(!store.is_pending("n1", "LIV Hub"));
    }

    #[test]
    fn patch_on_device_missing_from_poll_is_dropped() {
        let store = populated();
        let started = store.generation();
        store.apply_optimistic("n1", "Aux", |d| d.set_power(true));

        let kept = store.reconcile(
            started,
            [node("n1", true, vec![device("LIV Hub", false, 80.0)])],
        );

        assert_eq!(kept, Some(0));
        assert!(store.device("n1", "Aux").is_none());
        assert!(!store.is_pending("n1", "Aux"));
    }

    #[tokio::test]
    async fn reconcile_announces_commit() {
        let store = populated();
        let mut rx = store.subscribe();
        let started = store.generation();

        store.reconcile(started, [node("n1", true, vec![device("LIV Hub", false, 1.0)])]);

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::Replaced {
                generation: started + 1,
                nodes: 1,
                kept_optimistic: 0,
            }
        );
    }

    #[test]
    fn poll_older_than_last_commit_is_refused() {
        let store = populated();
        let slow_started = store.generation();
        store.apply_optimistic("n1", "LIV Hub", |d| d.set_power(true));

        // A poll started after the patch commits first with the cloud's
        // confirmed state.
        let fast_started = store.generation();
        let fresh = [node("n1", true, vec![device("LIV Hub", true, 70.0)])];
        assert_eq!(store.reconcile(fast_started, fresh), Some(0));
        let committed = store.nodes();
        let generation = store.generation();

        // The slow poll fetched before the patch and must not undo either.
        let outdated = [node("n1", true, vec![device("LIV Hub", false, 80.0)])];
        assert_eq!(store.reconcile(slow_started, outdated), None);

        assert_eq!(store.nodes(), committed);
        assert_eq!(store.generation(), generation);
        assert!(store.device("n1", "LIV Hub").unwrap().power());
    }

    #[test]
    fn poll_older_than_replace_all_is_refused() {
        let store = populated();
        let started = store.generation();
        store.replace_all([node("n2", true, vec![device("LIV Hub", true, 5.0)])]);

        assert_eq!(
            store.reconcile(started, [node("n1", true, vec![device("LIV Hub", false, 1.0)])]),
            None
        );
        assert!(store.node("n1").is_none());
    }
}
