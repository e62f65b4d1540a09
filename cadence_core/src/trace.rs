// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-loop event stream.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! engine calls at each stage of a tick. All method bodies default to no-ops,
//! so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! This stream is separate from the `tracing` log records the engine emits:
//! logs describe faults and decisions, while trace events carry per-tick
//! timing meant for recording and export.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::capability::CapabilityReport;
use crate::controller::QualityChange;
use crate::coordinator::TickReport;
use crate::priority::PriorityTier;
use crate::registry::CallbackHandle;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a tick starts.
#[derive(Clone, Copy, Debug)]
pub struct TickBeginEvent {
    /// Tick counter.
    pub tick: u64,
    /// Display-refresh timestamp that triggered the tick, in ms.
    pub timestamp_ms: f64,
    /// Clamped delta handed to callbacks, in ms.
    pub delta_ms: f64,
    /// Frame budget, in ms.
    pub target_ms: f64,
}

/// Emitted after each callback invocation.
#[derive(Clone, Copy, Debug)]
pub struct CallbackEvent<'a> {
    /// Tick counter.
    pub tick: u64,
    /// Which callback ran.
    pub handle: CallbackHandle,
    /// Producer-supplied identifier.
    pub id: &'a str,
    /// Callback priority.
    pub priority: PriorityTier,
    /// Measured run time, in ms.
    pub elapsed_ms: f64,
    /// Whether the callback completed without a fault.
    pub ok: bool,
}

/// Emitted when a callback's circuit breaker trips.
#[derive(Clone, Copy, Debug)]
pub struct BreakerTripEvent<'a> {
    /// Tick counter.
    pub tick: u64,
    /// Which callback was disabled.
    pub handle: CallbackHandle,
    /// Producer-supplied identifier.
    pub id: &'a str,
    /// Consecutive faults at the time of tripping.
    pub consecutive_failures: u32,
}

/// Emitted when the budget runs out and lower tiers are skipped.
#[derive(Clone, Copy, Debug)]
pub struct BudgetSkipEvent {
    /// Tick counter.
    pub tick: u64,
    /// Highest tier that was skipped; every lower tier was skipped too.
    pub from: PriorityTier,
    /// Number of enabled callbacks not invoked.
    pub skipped: usize,
    /// Budget consumed when the skip was decided, in ms.
    pub consumed_ms: f64,
}

/// Emitted after the queue flush.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Tick counter.
    pub tick: u64,
    /// Keys applied.
    pub applied: usize,
    /// Keys deferred by the batch cap.
    pub deferred: usize,
    /// Keys the sink rejected.
    pub failed: usize,
    /// Keys dropped as starved.
    pub dropped: usize,
    /// Batch cap in force.
    pub max_batch_size: usize,
    /// Measured flush time, in ms.
    pub elapsed_ms: f64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tick starts.
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        _ = e;
    }

    /// Called after each callback invocation.
    fn on_callback(&mut self, e: &CallbackEvent<'_>) {
        _ = e;
    }

    /// Called when a callback is disabled by its circuit breaker.
    fn on_breaker_trip(&mut self, e: &BreakerTripEvent<'_>) {
        _ = e;
    }

    /// Called when lower tiers are skipped for budget.
    fn on_budget_skip(&mut self, e: &BudgetSkipEvent) {
        _ = e;
    }

    /// Called after the queue flush.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called with the completed tick report.
    fn on_tick_complete(&mut self, r: &TickReport) {
        _ = r;
    }

    /// Called when the live quality tier changes.
    fn on_quality_change(&mut self, c: &QualityChange) {
        _ = c;
    }

    /// Called when the capability analyzer produces a report.
    fn on_capability_report(&mut self, r: &CapabilityReport) {
        _ = r;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $arg:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($arg);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $arg;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TickBeginEvent`].
    #[inline]
    pub fn tick_begin(&mut self, e: &TickBeginEvent) {
        dispatch!(self, on_tick_begin, e);
    }

    /// Emits a [`CallbackEvent`].
    #[inline]
    pub fn callback(&mut self, e: &CallbackEvent<'_>) {
        dispatch!(self, on_callback, e);
    }

    /// Emits a [`BreakerTripEvent`].
    #[inline]
    pub fn breaker_trip(&mut self, e: &BreakerTripEvent<'_>) {
        dispatch!(self, on_breaker_trip, e);
    }

    /// Emits a [`BudgetSkipEvent`].
    #[inline]
    pub fn budget_skip(&mut self, e: &BudgetSkipEvent) {
        dispatch!(self, on_budget_skip, e);
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        dispatch!(self, on_flush, e);
    }

    /// Emits a completed [`TickReport`].
    #[inline]
    pub fn tick_complete(&mut self, r: &TickReport) {
        dispatch!(self, on_tick_complete, r);
    }

    /// Emits a [`QualityChange`].
    #[inline]
    pub fn quality_change(&mut self, c: &QualityChange) {
        dispatch!(self, on_quality_change, c);
    }

    /// Emits a [`CapabilityReport`].
    #[inline]
    pub fn capability_report(&mut self, r: &CapabilityReport) {
        dispatch!(self, on_capability_report, r);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> TickBeginEvent {
        TickBeginEvent {
            tick: 42,
            timestamp_ms: 700.0,
            delta_ms: 16.7,
            target_ms: 16.67,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick_begin(&sample_begin());
        sink.on_budget_skip(&BudgetSkipEvent {
            tick: 1,
            from: PriorityTier::Low,
            skipped: 2,
            consumed_ms: 20.0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.tick_begin(&sample_begin());
        tracer.flush(&FlushEvent {
            tick: 1,
            applied: 0,
            deferred: 0,
            failed: 0,
            dropped: 0,
            max_batch_size: 8,
            elapsed_ms: 0.0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            ticks: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_tick_begin(&mut self, e: &TickBeginEvent) {
                self.ticks.push(e.tick);
            }
        }

        let mut sink = RecordingSink { ticks: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.tick_begin(&sample_begin());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.ticks, &[42]);
    }
}
