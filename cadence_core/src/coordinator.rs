// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The single prioritized frame loop.
//!
//! The [`FrameCoordinator`] replaces per-producer timers with one tick driven
//! by the host's display-refresh signal. It never schedules itself: the host
//! calls [`FrameCoordinator::tick`] once per refresh.
//!
//! # Tick algorithm
//!
//! 1. Compute the delta since the previous tick, clamped to
//!    [`EngineConfig::max_delta_ms`] so a backgrounded window does not
//!    produce one giant catch-up step.
//! 2. Reset the [`FrameBudget`].
//! 3. Run enabled callbacks tier by tier, `Critical` first, in registration
//!    order within a tier, charging each run to the budget. Before starting
//!    a tier below `Critical`, if the budget is already exceeded, every
//!    remaining tier is skipped for this tick. Tiers below the
//!    [`TickPlan::floor`] are skipped regardless of budget.
//! 4. Flush the update queue once, with the plan's batch cap. Flush time is
//!    charged to the budget too.
//! 5. Close the budget and return a [`TickReport`].
//!
//! A callback fault (an `Err` return, or a panic with the `std` feature) is
//! logged with the callback id and counted; after
//! [`EngineConfig::failure_threshold`] consecutive faults the callback is
//! disabled. The loop itself never stops because of a producer.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::budget::{BudgetHistory, BudgetSummary, FrameBudget};
use crate::config::EngineConfig;
use crate::error::{CallbackError, StaleHandle};
use crate::priority::PriorityTier;
use crate::quality::QualityState;
use crate::queue::{Enqueuer, FlushReport, QueueStats, UpdateQueue};
use crate::registry::{
    CallbackHandle, CallbackInfo, CallbackState, FaultOutcome, FrameCallback, Registry,
};
use crate::sink::PropertySink;
use crate::time::Clock;
use crate::trace::{
    BreakerTripEvent, BudgetSkipEvent, CallbackEvent, FlushEvent, TickBeginEvent, Tracer,
};

/// Number of recent ticks summarized by [`FrameCoordinator::budget_summary`].
pub const HISTORY_TICKS: usize = 120;

/// What a callback sees when it runs.
pub struct FrameContext<'a> {
    /// Current tick counter (the first tick is 1).
    pub tick: u64,
    /// Milliseconds since the previous tick, clamped.
    pub delta_ms: f64,
    /// Quality snapshot taken at the start of the tick.
    pub quality: QualityState,
    enqueuer: &'a Enqueuer,
}

impl FrameContext<'_> {
    /// Upserts a pending property write. See
    /// [`UpdateQueue::enqueue`](crate::queue::UpdateQueue::enqueue).
    pub fn enqueue(&self, key: &str, value: impl Into<String>, priority: PriorityTier) {
        self.enqueuer.enqueue(key, value, priority);
    }

    /// Returns a producer handle that outlives this tick.
    #[must_use]
    pub fn enqueuer(&self) -> Enqueuer {
        self.enqueuer.clone()
    }
}

impl fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("tick", &self.tick)
            .field("delta_ms", &self.delta_ms)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

/// Per-tick instructions from the adaptive controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickPlan {
    /// Lowest callback priority admitted this tick.
    pub floor: PriorityTier,
    /// Flush cap for this tick.
    pub max_batch_size: usize,
    /// Quality snapshot handed to callbacks.
    pub quality: QualityState,
}

/// Outcome of one tick; the tick-complete signal.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// Tick counter.
    pub tick: u64,
    /// Clamped delta handed to callbacks, in ms.
    pub delta_ms: f64,
    /// Frame budget, in ms.
    pub target_ms: f64,
    /// Time spent in callbacks and flush, in ms.
    pub consumed_ms: f64,
    /// Whether `consumed_ms` exceeded `target_ms`.
    pub overrun: bool,
    /// Decaying overrun counter after this tick.
    pub overrun_count: u32,
    /// Callbacks invoked.
    pub callbacks_run: usize,
    /// Invocations that faulted.
    pub callbacks_failed: usize,
    /// Enabled callbacks not invoked because the budget ran out.
    pub skipped_for_budget: usize,
    /// Enabled callbacks not invoked because their tier is below the floor.
    pub skipped_for_quality: usize,
    /// Highest tier skipped for budget, if any.
    pub budget_cut: Option<PriorityTier>,
    /// Result of the flush.
    pub flush: FlushReport,
}

impl TickReport {
    /// Returns consumed time as a fraction of the budget.
    #[must_use]
    pub fn load(&self) -> f64 {
        self.consumed_ms / self.target_ms
    }
}

/// Drives registered callbacks and the update queue, once per tick.
pub struct FrameCoordinator {
    registry: Registry,
    queue: Rc<RefCell<UpdateQueue>>,
    enqueuer: Enqueuer,
    clock: Box<dyn Clock>,
    budget: FrameBudget,
    history: BudgetHistory<HISTORY_TICKS>,
    max_delta_ms: f64,
    failure_threshold: u32,
    last_timestamp_ms: Option<f64>,
    tick: u64,
    callback_faults: u64,
}

impl fmt::Debug for FrameCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCoordinator")
            .field("tick", &self.tick)
            .field("registry", &self.registry)
            .field("budget", &self.budget)
            .field("pending", &self.queue.borrow().len())
            .finish_non_exhaustive()
    }
}

impl FrameCoordinator {
    /// Creates a coordinator. `config` is assumed to be validated.
    #[must_use]
    pub fn new(config: &EngineConfig, clock: Box<dyn Clock>) -> Self {
        let queue = Rc::new(RefCell::new(UpdateQueue::with_anti_starvation(
            config.anti_starvation_ticks,
        )));
        Self {
            registry: Registry::default(),
            enqueuer: Enqueuer::new(Rc::clone(&queue)),
            queue,
            clock,
            budget: FrameBudget::new(config.target_frame_ms, config.overrun_decay_ticks),
            history: BudgetHistory::new(),
            max_delta_ms: config.max_delta_ms,
            failure_threshold: config.failure_threshold,
            last_timestamp_ms: None,
            tick: 0,
            callback_faults: 0,
        }
    }

    // -- Registration API --

    /// Registers a per-frame callback. It starts [`CallbackState::Enabled`].
    pub fn register<F>(
        &mut self,
        id: impl Into<String>,
        priority: PriorityTier,
        callback: F,
    ) -> CallbackHandle
    where
        F: FnMut(&FrameContext<'_>) -> Result<(), CallbackError> + 'static,
    {
        let id = id.into();
        tracing::debug!(callback = %id, %priority, "registering frame callback");
        let callback: FrameCallback = Box::new(callback);
        self.registry.insert(id, priority, callback)
    }

    /// Re-enables a callback, clearing its fault streak.
    pub fn enable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.registry.enable(handle)
    }

    /// Disables a callback without unregistering it.
    pub fn disable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.registry.disable(handle)
    }

    /// Unregisters a callback and frees its slot.
    pub fn unregister(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.registry.remove(handle)
    }

    /// Returns the state of a callback, or `None` for a stale handle.
    #[must_use]
    pub fn state(&self, handle: CallbackHandle) -> Option<CallbackState> {
        self.registry.state(handle)
    }

    /// Returns details of a callback, or `None` for a stale handle.
    #[must_use]
    pub fn info(&self, handle: CallbackHandle) -> Option<CallbackInfo<'_>> {
        self.registry.info(handle)
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    /// Returns every registered callback that is currently disabled.
    #[must_use]
    pub fn disabled(&self) -> Vec<CallbackInfo<'_>> {
        self.registry.disabled().collect()
    }

    // -- Queue access --

    /// Returns a write-only handle to the update queue.
    #[must_use]
    pub fn enqueuer(&self) -> Enqueuer {
        self.enqueuer.clone()
    }

    /// Returns pending keys per priority.
    #[must_use]
    pub fn queue_depth(&self) -> [usize; 4] {
        self.queue.borrow().depth_by_priority()
    }

    /// Returns the queue's lifetime counters.
    #[must_use]
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.borrow().stats()
    }

    // -- Budget access --

    /// Returns the budget as of the last tick.
    #[must_use]
    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    /// Summarizes the last [`HISTORY_TICKS`] ticks.
    #[must_use]
    pub fn budget_summary(&self) -> BudgetSummary {
        self.history.summary(&self.budget)
    }

    /// Returns the recent tick history.
    #[must_use]
    pub fn history(&self) -> &BudgetHistory<HISTORY_TICKS> {
        &self.history
    }

    /// Returns the number of completed ticks.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Returns the number of callback faults since construction.
    #[must_use]
    pub fn callback_faults(&self) -> u64 {
        self.callback_faults
    }

    // -- Tick --

    /// Runs one tick for the display refresh at `timestamp_ms`.
    pub fn tick(
        &mut self,
        timestamp_ms: f64,
        plan: &TickPlan,
        sink: &mut dyn PropertySink,
        tracer: &mut Tracer<'_>,
    ) -> TickReport {
        self.tick += 1;
        let tick = self.tick;
        let delta_ms = self.delta_since_last(timestamp_ms);

        self.queue.borrow_mut().advance_tick(tick);
        self.budget.reset();
        tracer.tick_begin(&TickBeginEvent {
            tick,
            timestamp_ms,
            delta_ms,
            target_ms: self.budget.target_ms,
        });

        let ctx = FrameContext {
            tick,
            delta_ms,
            quality: plan.quality,
            enqueuer: &self.enqueuer,
        };

        let mut callbacks_run = 0;
        let mut callbacks_failed = 0;
        let mut skipped_for_budget = 0;
        let mut skipped_for_quality = 0;
        let mut budget_cut = None;

        for priority in PriorityTier::ALL {
            if priority < plan.floor {
                skipped_for_quality += self.registry.enabled_count(priority);
                continue;
            }
            if priority != PriorityTier::Critical && self.budget.exceeded() {
                let skipped = self.registry.enabled_count(priority);
                skipped_for_budget += skipped;
                if budget_cut.is_none() {
                    budget_cut = Some(priority);
                    tracing::debug!(
                        tick,
                        from = %priority,
                        consumed_ms = self.budget.consumed_ms,
                        "frame budget exhausted; skipping lower tiers"
                    );
                    tracer.budget_skip(&BudgetSkipEvent {
                        tick,
                        from: priority,
                        skipped,
                        consumed_ms: self.budget.consumed_ms,
                    });
                }
                continue;
            }

            let mut i = 0;
            while let Some(&idx) = self.registry.order(priority).get(i) {
                i += 1;
                if !self.registry.is_enabled_at(idx) {
                    continue;
                }
                let start = self.clock.now_ms();
                let result = self.registry.invoke_at(idx, &ctx);
                let elapsed_ms = self.clock.now_ms() - start;
                self.budget.charge(elapsed_ms);
                callbacks_run += 1;

                let handle = self.registry.handle_at(idx);
                match &result {
                    Ok(()) => self.registry.record_success(idx),
                    Err(err) => {
                        callbacks_failed += 1;
                        self.callback_faults += 1;
                        match self.registry.record_fault(idx, self.failure_threshold) {
                            FaultOutcome::Counted(streak) => {
                                tracing::warn!(
                                    callback = self.registry.id_at(idx),
                                    error = %err,
                                    consecutive_failures = streak,
                                    "frame callback failed"
                                );
                            }
                            FaultOutcome::Tripped(streak) => {
                                tracing::warn!(
                                    callback = self.registry.id_at(idx),
                                    error = %err,
                                    consecutive_failures = streak,
                                    "frame callback disabled by circuit breaker"
                                );
                                tracer.breaker_trip(&BreakerTripEvent {
                                    tick,
                                    handle,
                                    id: self.registry.id_at(idx),
                                    consecutive_failures: streak,
                                });
                            }
                        }
                    }
                }
                tracer.callback(&CallbackEvent {
                    tick,
                    handle,
                    id: self.registry.id_at(idx),
                    priority,
                    elapsed_ms,
                    ok: result.is_ok(),
                });
            }
        }

        let flush_start = self.clock.now_ms();
        let batch = self.queue.borrow_mut().take_batch(plan.max_batch_size);
        let flush = batch.apply(sink);
        self.queue.borrow_mut().record_failures(flush.failed.len());
        let flush_ms = self.clock.now_ms() - flush_start;
        self.budget.charge(flush_ms);
        tracer.flush(&FlushEvent {
            tick,
            applied: flush.applied.len(),
            deferred: flush.deferred.len(),
            failed: flush.failed.len(),
            dropped: flush.dropped.len(),
            max_batch_size: plan.max_batch_size,
            elapsed_ms: flush_ms,
        });

        let overrun = self.budget.settle();
        self.history.record(self.budget.consumed_ms, overrun);

        let report = TickReport {
            tick,
            delta_ms,
            target_ms: self.budget.target_ms,
            consumed_ms: self.budget.consumed_ms,
            overrun,
            overrun_count: self.budget.overrun_count,
            callbacks_run,
            callbacks_failed,
            skipped_for_budget,
            skipped_for_quality,
            budget_cut,
            flush,
        };
        tracing::trace!(
            tick,
            delta_ms,
            consumed_ms = report.consumed_ms,
            overrun,
            applied = report.flush.applied.len(),
            deferred = report.flush.deferred.len(),
            "tick complete"
        );
        tracer.tick_complete(&report);
        report
    }

    fn delta_since_last(&mut self, timestamp_ms: f64) -> f64 {
        let delta = match self.last_timestamp_ms {
            Some(prev) if timestamp_ms > prev => (timestamp_ms - prev).min(self.max_delta_ms),
            _ => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        delta
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::quality::QualityTier;
    use crate::sink::MemorySink;
    use crate::time::ManualClock;

    fn setup() -> (FrameCoordinator, ManualClock) {
        let clock = ManualClock::new(0.0);
        let coord = FrameCoordinator::new(&EngineConfig::new(), Box::new(clock.clone()));
        (coord, clock)
    }

    fn open_plan() -> TickPlan {
        TickPlan {
            floor: PriorityTier::Low,
            max_batch_size: usize::MAX,
            quality: QualityState::new(QualityTier::High, 0),
        }
    }

    fn run(coord: &mut FrameCoordinator, ts: f64, sink: &mut MemorySink) -> TickReport {
        coord.tick(ts, &open_plan(), sink, &mut Tracer::none())
    }

    /// Registers a callback that appends `name` to a shared log and costs
    /// `cost_ms` on the manual clock.
    fn logging(
        coord: &mut FrameCoordinator,
        clock: &ManualClock,
        log: &Rc<RefCell<Vec<&'static str>>>,
        name: &'static str,
        priority: PriorityTier,
        cost_ms: f64,
    ) -> CallbackHandle {
        let clock = clock.clone();
        let log = Rc::clone(log);
        coord.register(name, priority, move |_| {
            log.borrow_mut().push(name);
            clock.advance(cost_ms);
            Ok(())
        })
    }

    #[test]
    fn callbacks_run_in_priority_then_registration_order() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        logging(&mut coord, &clock, &log, "ambient", PriorityTier::Low, 0.0);
        logging(&mut coord, &clock, &log, "press", PriorityTier::Critical, 0.0);
        logging(&mut coord, &clock, &log, "pulse-a", PriorityTier::High, 0.0);
        logging(&mut coord, &clock, &log, "pulse-b", PriorityTier::High, 0.0);

        let report = run(&mut coord, 0.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["press", "pulse-a", "pulse-b", "ambient"]);
        assert_eq!(report.callbacks_run, 4);
        assert!(!report.overrun);
    }

    #[test]
    fn delta_is_clamped_and_first_tick_is_zero() {
        let (mut coord, _clock) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        coord.register("dt", PriorityTier::Normal, move |ctx| {
            s.borrow_mut().push(ctx.delta_ms);
            Ok(())
        });

        let mut sink = MemorySink::new();
        run(&mut coord, 1000.0, &mut sink);
        run(&mut coord, 1016.0, &mut sink);
        run(&mut coord, 9000.0, &mut sink);
        run(&mut coord, 8000.0, &mut sink);
        assert_eq!(*seen.borrow(), vec![0.0, 16.0, 250.0, 0.0]);
    }

    #[test]
    fn budget_overrun_skips_lower_tiers_and_counts_once() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        logging(&mut coord, &clock, &log, "heavy", PriorityTier::High, 20.0);
        logging(&mut coord, &clock, &log, "normal", PriorityTier::Normal, 1.0);
        logging(&mut coord, &clock, &log, "sparkle", PriorityTier::Low, 1.0);

        let report = run(&mut coord, 0.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["heavy"]);
        assert_eq!(report.skipped_for_budget, 2);
        assert_eq!(report.budget_cut, Some(PriorityTier::Normal));
        assert!(report.overrun);
        assert_eq!(report.overrun_count, 1);
        assert_eq!(coord.budget().overrun_count, 1);

        // Skipped callbacks are not disabled.
        log.borrow_mut().clear();
        clock.set(0.0);
        coord.unregister(coord_handle_for(&coord, "heavy")).unwrap();
        run(&mut coord, 16.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["normal", "sparkle"]);
    }

    fn coord_handle_for(coord: &FrameCoordinator, id: &str) -> CallbackHandle {
        for priority in PriorityTier::ALL {
            for &idx in coord.registry.order(priority) {
                if coord.registry.id_at(idx) == id {
                    return coord.registry.handle_at(idx);
                }
            }
        }
        panic!("no callback named {id}");
    }

    #[test]
    fn critical_tier_always_runs() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        logging(&mut coord, &clock, &log, "a", PriorityTier::Critical, 30.0);
        logging(&mut coord, &clock, &log, "b", PriorityTier::Critical, 30.0);
        let report = run(&mut coord, 0.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(report.consumed_ms, 60.0);
    }

    #[test]
    fn floor_skips_low_tiers_without_overrun() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        logging(&mut coord, &clock, &log, "core", PriorityTier::High, 1.0);
        logging(&mut coord, &clock, &log, "decor", PriorityTier::Low, 1.0);

        let plan = TickPlan {
            floor: PriorityTier::High,
            ..open_plan()
        };
        let report = coord.tick(0.0, &plan, &mut MemorySink::new(), &mut Tracer::none());
        assert_eq!(*log.borrow(), vec!["core"]);
        assert_eq!(report.skipped_for_quality, 1);
        assert_eq!(report.skipped_for_budget, 0);
        assert!(!report.overrun);
    }

    #[test]
    fn circuit_breaker_disables_after_three_faults() {
        let (mut coord, _clock) = setup();
        let calls = Rc::new(RefCell::new(0_u32));
        let c = Rc::clone(&calls);
        let handle = coord.register("beat-pulse", PriorityTier::High, move |_| {
            *c.borrow_mut() += 1;
            Err(CallbackError::new("analysis buffer empty"))
        });

        let mut sink = MemorySink::new();
        for ts in [0.0, 16.0, 32.0] {
            let report = run(&mut coord, ts, &mut sink);
            assert_eq!(report.callbacks_failed, 1);
        }
        assert_eq!(
            coord.state(handle),
            Some(CallbackState::Disabled(crate::registry::DisableReason::CircuitBreaker))
        );

        let report = run(&mut coord, 48.0, &mut sink);
        assert_eq!(*calls.borrow(), 3, "tripped callback is not invoked");
        assert_eq!(report.callbacks_run, 0);
        assert_eq!(coord.disabled().len(), 1);
        assert_eq!(coord.callback_faults(), 3);

        coord.enable(handle).unwrap();
        run(&mut coord, 64.0, &mut sink);
        assert_eq!(*calls.borrow(), 4, "re-enabled callback runs again");
    }

    #[test]
    fn fault_in_one_callback_does_not_stop_others() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        coord.register("broken", PriorityTier::High, |_| Err("boom".into()));
        logging(&mut coord, &clock, &log, "healthy", PriorityTier::High, 0.0);
        let report = run(&mut coord, 0.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["healthy"]);
        assert_eq!(report.callbacks_run, 2);
        assert_eq!(report.callbacks_failed, 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_callback_counts_as_fault() {
        let (mut coord, _clock) = setup();
        let handle = coord.register("panicky", PriorityTier::Normal, |_| panic!("bad frame"));
        let mut sink = MemorySink::new();
        for ts in [0.0, 16.0, 32.0] {
            let report = run(&mut coord, ts, &mut sink);
            assert_eq!(report.callbacks_failed, 1);
        }
        assert!(matches!(coord.state(handle), Some(CallbackState::Disabled(_))));
    }

    #[test]
    fn callbacks_enqueue_and_flush_applies_once_per_tick() {
        let (mut coord, _clock) = setup();
        coord.register("color", PriorityTier::Normal, |ctx| {
            ctx.enqueue("accent-rgb", "255,0,0", PriorityTier::High);
            ctx.enqueue("accent-rgb", "0,255,0", PriorityTier::High);
            Ok(())
        });
        let mut sink = MemorySink::new();
        let report = run(&mut coord, 0.0, &mut sink);
        assert_eq!(report.flush.applied.len(), 1);
        assert_eq!(sink.applied(), &[(String::from("accent-rgb"), String::from("0,255,0"))]);
    }

    #[test]
    fn flush_time_counts_against_budget() {
        struct SlowSink(ManualClock);
        impl PropertySink for SlowSink {
            fn apply_property(
                &mut self,
                _key: &str,
                _value: &str,
            ) -> Result<(), crate::error::SinkError> {
                self.0.advance(10.0);
                Ok(())
            }
        }

        let (mut coord, clock) = setup();
        let producer = coord.enqueuer();
        producer.enqueue("a", "1", PriorityTier::Normal);
        producer.enqueue("b", "1", PriorityTier::Normal);
        let report = coord.tick(
            0.0,
            &open_plan(),
            &mut SlowSink(clock.clone()),
            &mut Tracer::none(),
        );
        assert_eq!(report.consumed_ms, 20.0);
        assert!(report.overrun);
    }

    #[test]
    fn disabled_callback_is_skipped_but_retained() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let h = logging(&mut coord, &clock, &log, "x", PriorityTier::Normal, 0.0);
        coord.disable(h).unwrap();
        run(&mut coord, 0.0, &mut MemorySink::new());
        assert!(log.borrow().is_empty());
        assert_eq!(coord.registered(), 1);
        coord.enable(h).unwrap();
        run(&mut coord, 16.0, &mut MemorySink::new());
        assert_eq!(*log.borrow(), vec!["x"]);
    }

    #[test]
    fn history_feeds_summary() {
        let (mut coord, clock) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        logging(&mut coord, &clock, &log, "w", PriorityTier::Normal, 8.0);
        for i in 0..10_u32 {
            run(&mut coord, f64::from(i) * 16.0, &mut MemorySink::new());
        }
        let summary = coord.budget_summary();
        assert_eq!(summary.samples, 10);
        assert_eq!(summary.mean_ms, 8.0);
        assert_eq!(summary.overrun_ticks, 0);
        assert_eq!(coord.current_tick(), 10);
    }
}
