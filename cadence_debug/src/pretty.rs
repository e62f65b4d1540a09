// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use cadence_core::capability::CapabilityReport;
use cadence_core::controller::QualityChange;
use cadence_core::coordinator::TickReport;
use cadence_core::trace::{
    BreakerTripEvent, BudgetSkipEvent, CallbackEvent, FlushEvent, TickBeginEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    callbacks: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            callbacks: true,
        }
    }

    /// Omits per-callback lines, which dominate the output of busy sessions.
    #[must_use]
    pub fn without_callbacks(mut self) -> Self {
        self.callbacks = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] n={} at={:.2}ms dt={:.2}ms budget={:.2}ms",
            e.tick, e.timestamp_ms, e.delta_ms, e.target_ms,
        );
    }

    fn on_callback(&mut self, e: &CallbackEvent<'_>) {
        if !self.callbacks {
            return;
        }
        let status = if e.ok { "ok" } else { "FAULT" };
        let _ = writeln!(
            self.writer,
            "[callback] n={} {} ({}) {:.3}ms {status}",
            e.tick, e.id, e.priority, e.elapsed_ms,
        );
    }

    fn on_breaker_trip(&mut self, e: &BreakerTripEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[breaker] n={} {} disabled after {} consecutive faults",
            e.tick, e.id, e.consecutive_failures,
        );
    }

    fn on_budget_skip(&mut self, e: &BudgetSkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] n={} from={} callbacks={} consumed={:.2}ms",
            e.tick, e.from, e.skipped, e.consumed_ms,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] n={} applied={} deferred={} failed={} dropped={} cap={} {:.3}ms",
            e.tick, e.applied, e.deferred, e.failed, e.dropped, e.max_batch_size, e.elapsed_ms,
        );
    }

    fn on_tick_complete(&mut self, r: &TickReport) {
        let overrun = if r.overrun { "OVERRUN" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[summary] n={} consumed={:.2}/{:.2}ms run={} failed={} \
             skipped={}+{} overruns={} {overrun}",
            r.tick,
            r.consumed_ms,
            r.target_ms,
            r.callbacks_run,
            r.callbacks_failed,
            r.skipped_for_budget,
            r.skipped_for_quality,
            r.overrun_count,
        );
    }

    fn on_quality_change(&mut self, c: &QualityChange) {
        let _ = writeln!(
            self.writer,
            "[quality] n={} {} -> {} x{} ({})",
            c.tick, c.from, c.to, c.multiplier, c.reason,
        );
    }

    fn on_capability_report(&mut self, r: &CapabilityReport) {
        let _ = writeln!(
            self.writer,
            "[capability] at={:.0}ms tier={} notes={}",
            r.at_ms,
            r.tier,
            r.notes().join("; "),
        );
    }
}
