// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event as an
//! owned [`RecordedEvent`], so a session can be inspected or exported after
//! the engine that produced it is gone. Borrowed callback ids are copied.

use cadence_core::capability::CapabilityReport;
use cadence_core::controller::QualityChange;
use cadence_core::coordinator::TickReport;
use cadence_core::priority::PriorityTier;
use cadence_core::registry::CallbackHandle;
use cadence_core::trace::{
    BreakerTripEvent, BudgetSkipEvent, CallbackEvent, FlushEvent, TickBeginEvent, TraceSink,
};

/// Owned copy of a [`CallbackEvent`].
#[derive(Clone, Debug, PartialEq)]
pub struct CallbackRecord {
    /// Tick counter.
    pub tick: u64,
    /// Which callback ran.
    pub handle: CallbackHandle,
    /// Producer-supplied identifier.
    pub id: String,
    /// Callback priority.
    pub priority: PriorityTier,
    /// Measured run time, in ms.
    pub elapsed_ms: f64,
    /// Whether the callback completed without a fault.
    pub ok: bool,
}

/// A decoded event from a [`RecorderSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_tick_begin`].
    TickBegin {
        /// Tick counter.
        tick: u64,
        /// Refresh timestamp, in ms.
        timestamp_ms: f64,
        /// Clamped delta, in ms.
        delta_ms: f64,
        /// Frame budget, in ms.
        target_ms: f64,
    },
    /// See [`TraceSink::on_callback`].
    Callback(CallbackRecord),
    /// See [`TraceSink::on_breaker_trip`].
    BreakerTrip {
        /// Tick counter.
        tick: u64,
        /// Producer-supplied identifier.
        id: String,
        /// Consecutive faults when tripped.
        consecutive_failures: u32,
    },
    /// See [`TraceSink::on_budget_skip`].
    BudgetSkip {
        /// Tick counter.
        tick: u64,
        /// Highest tier skipped.
        from: PriorityTier,
        /// Callbacks not invoked.
        skipped: usize,
    },
    /// See [`TraceSink::on_flush`].
    Flush {
        /// Tick counter.
        tick: u64,
        /// Keys applied.
        applied: usize,
        /// Keys deferred.
        deferred: usize,
        /// Keys the sink rejected.
        failed: usize,
        /// Keys dropped as starved.
        dropped: usize,
        /// Measured flush time, in ms.
        elapsed_ms: f64,
    },
    /// See [`TraceSink::on_tick_complete`].
    TickComplete {
        /// Tick counter.
        tick: u64,
        /// Time spent in callbacks and flush, in ms.
        consumed_ms: f64,
        /// Frame budget, in ms.
        target_ms: f64,
        /// Whether the tick overran.
        overrun: bool,
        /// Decaying overrun counter.
        overrun_count: u32,
    },
    /// See [`TraceSink::on_quality_change`].
    QualityChange(QualityChange),
    /// See [`TraceSink::on_capability_report`].
    Capability(CapabilityReport),
}

impl RecordedEvent {
    /// Returns the tick the event belongs to, if it has one.
    #[must_use]
    pub fn tick(&self) -> Option<u64> {
        match self {
            Self::TickBegin { tick, .. }
            | Self::BreakerTrip { tick, .. }
            | Self::BudgetSkip { tick, .. }
            | Self::Flush { tick, .. }
            | Self::TickComplete { tick, .. } => Some(*tick),
            Self::Callback(c) => Some(c.tick),
            Self::QualityChange(c) => Some(c.tick),
            Self::Capability(_) => None,
        }
    }
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for RecorderSink {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.events.push(RecordedEvent::TickBegin {
            tick: e.tick,
            timestamp_ms: e.timestamp_ms,
            delta_ms: e.delta_ms,
            target_ms: e.target_ms,
        });
    }

    fn on_callback(&mut self, e: &CallbackEvent<'_>) {
        self.events.push(RecordedEvent::Callback(CallbackRecord {
            tick: e.tick,
            handle: e.handle,
            id: e.id.to_owned(),
            priority: e.priority,
            elapsed_ms: e.elapsed_ms,
            ok: e.ok,
        }));
    }

    fn on_breaker_trip(&mut self, e: &BreakerTripEvent<'_>) {
        self.events.push(RecordedEvent::BreakerTrip {
            tick: e.tick,
            id: e.id.to_owned(),
            consecutive_failures: e.consecutive_failures,
        });
    }

    fn on_budget_skip(&mut self, e: &BudgetSkipEvent) {
        self.events.push(RecordedEvent::BudgetSkip {
            tick: e.tick,
            from: e.from,
            skipped: e.skipped,
        });
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.events.push(RecordedEvent::Flush {
            tick: e.tick,
            applied: e.applied,
            deferred: e.deferred,
            failed: e.failed,
            dropped: e.dropped,
            elapsed_ms: e.elapsed_ms,
        });
    }

    fn on_tick_complete(&mut self, r: &TickReport) {
        self.events.push(RecordedEvent::TickComplete {
            tick: r.tick,
            consumed_ms: r.consumed_ms,
            target_ms: r.target_ms,
            overrun: r.overrun,
            overrun_count: r.overrun_count,
        });
    }

    fn on_quality_change(&mut self, c: &QualityChange) {
        self.events.push(RecordedEvent::QualityChange(*c));
    }

    fn on_capability_report(&mut self, r: &CapabilityReport) {
        self.events.push(RecordedEvent::Capability(r.clone()));
    }
}
