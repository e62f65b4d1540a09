// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed, coalescing update queue.
//!
//! Producers write `(key, value, priority)` triples into the [`UpdateQueue`]
//! at any rate. The queue holds at most one pending entry per key: a newer
//! write replaces the older one, so a key written N times between two flushes
//! is applied exactly once, with the last value.
//!
//! # Ordering
//!
//! A flush takes entries by priority (most urgent first), then by the tick at
//! which the key became pending (oldest first), then by insertion order.
//! Overwriting a pending key replaces its value and priority but keeps its
//! place in line, so a key that is rewritten every frame cannot be starved by
//! its own writes.
//!
//! # Sharing
//!
//! Producers hold an [`Enqueuer`], which can only write. Draining is reserved
//! to whoever owns the queue (the
//! [`FrameCoordinator`](crate::coordinator::FrameCoordinator)).

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;

use crate::priority::PriorityTier;
use crate::sink::PropertySink;

/// Names one property on the render surface.
///
/// Cheap to clone; compares and hashes like the underlying string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyKey(Rc<str>);

impl PropertyKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::borrow::Borrow<str> for PropertyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyKey {
    fn from(key: &str) -> Self {
        Self(Rc::from(key))
    }
}

impl From<String> for PropertyKey {
    fn from(key: String) -> Self {
        Self(Rc::from(key))
    }
}

impl PartialEq<str> for PropertyKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for PropertyKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending write, as taken out of the queue by a flush.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingUpdate {
    /// Target property.
    pub key: PropertyKey,
    /// Most recently written value.
    pub value: String,
    /// Priority of the most recent write.
    pub priority: PriorityTier,
    /// Tick at which the key became pending.
    pub produced_at_tick: u64,
}

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    priority: PriorityTier,
    produced_at_tick: u64,
    seq: u64,
}

/// Lifetime counters kept by an [`UpdateQueue`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Total `enqueue` calls.
    pub writes: u64,
    /// Writes that replaced an already pending value.
    pub coalesced: u64,
    /// `Low` entries dropped by the anti-starvation policy.
    pub starvation_drops: u64,
    /// Applications rejected by the sink.
    pub sink_failures: u64,
}

/// A coalescing buffer of pending property writes.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    entries: HashMap<PropertyKey, Entry>,
    tick: u64,
    next_seq: u64,
    anti_starvation_ticks: Option<u64>,
    stats: QueueStats,
}

impl UpdateQueue {
    /// Creates an empty queue with no starvation drop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue that drops `Low` entries pending for more than
    /// `ticks` ticks. `None` disables the drop.
    ///
    /// Age counts from the tick at which the key first became pending.
    /// Overwriting a pending key does not reset it, so a `Low` value written
    /// on the current tick is dropped if its key has been waiting too long.
    #[must_use]
    pub fn with_anti_starvation(ticks: Option<u64>) -> Self {
        Self {
            anti_starvation_ticks: ticks,
            ..Self::default()
        }
    }

    /// Upserts the pending value for `key`.
    ///
    /// Never fails and never blocks. The previous pending value for `key`, if
    /// any, is discarded.
    pub fn enqueue(&mut self, key: &str, value: impl Into<String>, priority: PriorityTier) {
        let value = value.into();
        self.stats.writes += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value;
            entry.priority = priority;
            self.stats.coalesced += 1;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            PropertyKey::from(key),
            Entry {
                value,
                priority,
                produced_at_tick: self.tick,
                seq,
            },
        );
    }

    /// Sets the tick stamped onto newly pending keys and used for starvation.
    pub fn advance_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Returns the current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the number of pending keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` has a pending value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the pending value for `key`, if any.
    #[must_use]
    pub fn pending_value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Returns the number of pending keys per priority, indexed by
    /// [`PriorityTier::index`].
    #[must_use]
    pub fn depth_by_priority(&self) -> [usize; 4] {
        let mut depth = [0; 4];
        for entry in self.entries.values() {
            depth[entry.priority.index()] += 1;
        }
        depth
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Removes up to `max_batch_size` entries in flush order.
    ///
    /// Starved `Low` entries are dropped first. Entries beyond the cap stay
    /// pending and are listed in [`Batch::deferred`]. A cap of zero is treated
    /// as one so every flush makes progress.
    pub fn take_batch(&mut self, max_batch_size: usize) -> Batch {
        let dropped = self.drop_starved();

        let mut order: Vec<(PriorityTier, u64, u64, PropertyKey)> = self
            .entries
            .iter()
            .map(|(k, e)| (e.priority, e.produced_at_tick, e.seq, k.clone()))
            .collect();
        order.sort_unstable_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let cap = max_batch_size.max(1);
        let mut ready = Vec::with_capacity(cap.min(order.len()));
        let mut deferred = Vec::new();
        for (i, (_, _, _, key)) in order.into_iter().enumerate() {
            if i >= cap {
                deferred.push(key);
                continue;
            }
            if let Some((key, entry)) = self.entries.remove_entry(key.as_str()) {
                ready.push(PendingUpdate {
                    key,
                    value: entry.value,
                    priority: entry.priority,
                    produced_at_tick: entry.produced_at_tick,
                });
            }
        }

        Batch {
            ready,
            deferred,
            dropped,
        }
    }

    /// Takes a batch and applies it to `sink`.
    pub fn flush(&mut self, max_batch_size: usize, sink: &mut dyn PropertySink) -> FlushReport {
        let report = self.take_batch(max_batch_size).apply(sink);
        self.record_failures(report.failed.len());
        report
    }

    pub(crate) fn record_failures(&mut self, failures: usize) {
        self.stats.sink_failures += failures as u64;
    }

    fn drop_starved(&mut self) -> Vec<PropertyKey> {
        let Some(limit) = self.anti_starvation_ticks else {
            return Vec::new();
        };
        let now = self.tick;
        let mut dropped = Vec::new();
        self.entries.retain(|key, entry| {
            let starved = entry.priority == PriorityTier::Low
                && now.saturating_sub(entry.produced_at_tick) > limit;
            if starved {
                tracing::debug!(
                    key = %key,
                    pending_ticks = now - entry.produced_at_tick,
                    "dropping starved low-priority update"
                );
                dropped.push(key.clone());
            }
            !starved
        });
        self.stats.starvation_drops += dropped.len() as u64;
        dropped
    }
}

/// Entries taken out of the queue for one flush.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    /// Entries to apply, in flush order.
    pub ready: Vec<PendingUpdate>,
    /// Keys left pending because the cap was reached, in flush order.
    pub deferred: Vec<PropertyKey>,
    /// Keys removed by the anti-starvation policy.
    pub dropped: Vec<PropertyKey>,
}

impl Batch {
    /// Applies every ready entry to `sink`, in order.
    ///
    /// A sink error skips that key; it is reported in
    /// [`FlushReport::failed`] and not re-enqueued.
    pub fn apply(self, sink: &mut dyn PropertySink) -> FlushReport {
        let mut applied = Vec::with_capacity(self.ready.len());
        let mut failed = Vec::new();
        for update in self.ready {
            match sink.apply_property(update.key.as_str(), &update.value) {
                Ok(()) => applied.push(update.key),
                Err(err) => {
                    tracing::warn!(
                        key = %update.key,
                        error = %err,
                        "property sink rejected update"
                    );
                    failed.push(update.key);
                }
            }
        }
        FlushReport {
            applied,
            deferred: self.deferred,
            failed,
            dropped: self.dropped,
        }
    }
}

/// Outcome of one flush.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlushReport {
    /// Keys applied, in application order.
    pub applied: Vec<PropertyKey>,
    /// Keys still pending because the batch cap was hit.
    pub deferred: Vec<PropertyKey>,
    /// Keys the sink rejected.
    pub failed: Vec<PropertyKey>,
    /// Keys dropped as starved.
    pub dropped: Vec<PropertyKey>,
}

impl FlushReport {
    /// Returns `true` if the flush touched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
            && self.deferred.is_empty()
            && self.failed.is_empty()
            && self.dropped.is_empty()
    }
}

/// The producer-side handle to a shared [`UpdateQueue`].
///
/// Cloneable and write-only: there is no way to drain the queue through it.
#[derive(Clone)]
pub struct Enqueuer {
    queue: Rc<RefCell<UpdateQueue>>,
}

impl Enqueuer {
    pub(crate) fn new(queue: Rc<RefCell<UpdateQueue>>) -> Self {
        Self { queue }
    }

    /// Upserts the pending value for `key`. See [`UpdateQueue::enqueue`].
    pub fn enqueue(&self, key: &str, value: impl Into<String>, priority: PriorityTier) {
        self.queue.borrow_mut().enqueue(key, value, priority);
    }

    /// Returns the number of pending keys.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl fmt::Debug for Enqueuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enqueuer")
            .field("pending", &self.pending())
            .finish()
    }
}
