// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The producer-facing façade.
//!
//! [`Engine`] wires the four components into one feedback loop:
//!
//! ```text
//! tick(ts) ─► FrameCoordinator ─► TickReport ─► AdaptiveController ─► QualityState
//!                  ▲                                   ▲
//!                  └── floor + batch cap ──────────────┤
//!                                                      │
//!             CapabilityAnalyzer ── prior (every ~30 s)┘
//! ```

use alloc::boxed::Box;
use alloc::string::String;

use crate::capability::{CapabilityAnalyzer, DeviceSignals};
use crate::config::EngineConfig;
use crate::controller::AdaptiveController;
use crate::coordinator::{FrameContext, FrameCoordinator, TickReport};
use crate::diagnostics::{Diagnostics, DisabledCallback};
use crate::error::{CallbackError, ConfigError, StaleHandle};
use crate::priority::PriorityTier;
use crate::quality::{QualityReader, QualityState};
use crate::queue::Enqueuer;
use crate::registry::{CallbackHandle, CallbackState};
use crate::sink::PropertySink;
use crate::time::Clock;
use crate::trace::{TraceSink, Tracer};

/// A frame-budgeted update engine driving one render surface.
#[derive(Debug)]
pub struct Engine<S: PropertySink> {
    config: EngineConfig,
    coordinator: FrameCoordinator,
    controller: AdaptiveController,
    analyzer: CapabilityAnalyzer,
    sink: S,
}

impl<S: PropertySink> Engine<S> {
    /// Validates `config` and builds an engine whose initial tier comes from
    /// assessing `signals`.
    pub fn new(
        config: EngineConfig,
        signals: DeviceSignals,
        sink: S,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyzer =
            CapabilityAnalyzer::new(signals, config.reevaluate_interval_ms, clock.now_ms());
        let controller = AdaptiveController::new(&config, analyzer.prior());
        let coordinator = FrameCoordinator::new(&config, Box::new(clock));
        Ok(Self {
            config,
            coordinator,
            controller,
            analyzer,
            sink,
        })
    }

    /// Registers a per-frame callback.
    pub fn register<F>(
        &mut self,
        id: impl Into<String>,
        priority: PriorityTier,
        callback: F,
    ) -> CallbackHandle
    where
        F: FnMut(&FrameContext<'_>) -> Result<(), CallbackError> + 'static,
    {
        self.coordinator.register(id, priority, callback)
    }

    /// Re-enables a callback and clears its fault streak.
    pub fn enable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.coordinator.enable(handle)
    }

    /// Disables a callback without unregistering it.
    pub fn disable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.coordinator.disable(handle)
    }

    /// Unregisters a callback.
    pub fn unregister(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        self.coordinator.unregister(handle)
    }

    /// Returns the state of a callback, or `None` for a stale handle.
    #[must_use]
    pub fn state(&self, handle: CallbackHandle) -> Option<CallbackState> {
        self.coordinator.state(handle)
    }

    /// Upserts a pending property write.
    pub fn enqueue(&self, key: &str, value: impl Into<String>, priority: PriorityTier) {
        self.coordinator.enqueuer().enqueue(key, value, priority);
    }

    /// Returns a write-only queue handle for producers outside the tick.
    #[must_use]
    pub fn enqueuer(&self) -> Enqueuer {
        self.coordinator.enqueuer()
    }

    /// Returns the live quality snapshot.
    #[must_use]
    pub fn quality_state(&self) -> QualityState {
        self.controller.quality()
    }

    /// Returns a reader producers can keep and poll.
    #[must_use]
    pub fn quality_reader(&self) -> QualityReader {
        self.controller.reader()
    }

    /// Takes a diagnostics snapshot.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let quality = self.controller.quality();
        let stats = self.coordinator.queue_stats();
        Diagnostics {
            tick: self.coordinator.current_tick(),
            tier: quality.tier,
            multiplier: quality.multiplier,
            overrun_count: self.coordinator.budget().overrun_count,
            queue_depth: self.coordinator.queue_depth(),
            disabled: self
                .coordinator
                .disabled()
                .iter()
                .filter_map(DisabledCallback::from_info)
                .collect(),
            registered: self.coordinator.registered(),
            starvation_drops: stats.starvation_drops,
            sink_failures: stats.sink_failures,
            callback_faults: self.coordinator.callback_faults(),
        }
    }

    /// Runs one tick for the display refresh at `timestamp_ms`.
    ///
    /// A capability re-evaluation is forwarded to the controller only when it
    /// falls below the previous assessment.
    pub fn tick(&mut self, timestamp_ms: f64) -> TickReport {
        self.run_tick(timestamp_ms, &mut Tracer::none())
    }

    /// Runs one tick, reporting frame-loop events to `trace`.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn tick_traced(&mut self, timestamp_ms: f64, trace: &mut dyn TraceSink) -> TickReport {
        self.run_tick(timestamp_ms, &mut Tracer::new(trace))
    }

    fn run_tick(&mut self, timestamp_ms: f64, tracer: &mut Tracer<'_>) -> TickReport {
        let plan = self.controller.plan();
        let report = self
            .coordinator
            .tick(timestamp_ms, &plan, &mut self.sink, tracer);

        if let Some(change) = self.controller.observe(&report) {
            tracer.quality_change(&change);
        }

        let recent = self.coordinator.budget_summary();
        let previous = self.analyzer.prior();
        if let Some(capability) = self.analyzer.poll(timestamp_ms, &recent) {
            tracer.capability_report(&capability);
            // Only a prior below the previous assessment reaches the controller.
            if capability.tier < previous
                && let Some(change) = self.controller.apply_prior(capability.tier, report.tick)
            {
                tracer.quality_change(&change);
            }
        }
        report
    }

    /// Returns the coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &FrameCoordinator {
        &self.coordinator
    }

    /// Returns the adaptive controller.
    #[must_use]
    pub fn controller(&self) -> &AdaptiveController {
        &self.controller
    }

    /// Returns the capability analyzer.
    #[must_use]
    pub fn capability(&self) -> &CapabilityAnalyzer {
        &self.analyzer
    }

    /// Returns the render-surface sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the render-surface sink mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the validated configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::capability::DeviceClass;
    use crate::config::BatchSizes;
    use crate::error::SinkError;
    use crate::quality::QualityTier;
    use crate::registry::DisableReason;
    use crate::sink::MemorySink;
    use crate::time::ManualClock;

    fn desktop() -> DeviceSignals {
        DeviceSignals {
            logical_cores: Some(8),
            memory_gb: Some(8.0),
            gpu_accelerated: Some(true),
            class: DeviceClass::Desktop,
            reduced_motion: false,
        }
    }

    fn engine() -> (Engine<MemorySink>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let engine = Engine::new(
            EngineConfig::new(),
            desktop(),
            MemorySink::new(),
            clock.clone(),
        )
        .unwrap();
        (engine, clock)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            target_frame_ms: 0.0,
            ..EngineConfig::new()
        };
        let err = Engine::new(config, desktop(), MemorySink::new(), ManualClock::new(0.0))
            .unwrap_err();
        assert_eq!(err, ConfigError::TargetFrame(0.0));
    }

    #[test]
    fn initial_tier_comes_from_capability() {
        let phone = DeviceSignals {
            logical_cores: Some(2),
            class: DeviceClass::Mobile,
            ..desktop()
        };
        let engine = Engine::new(
            EngineConfig::new(),
            phone,
            MemorySink::new(),
            ManualClock::new(0.0),
        )
        .unwrap();
        assert_eq!(engine.quality_state().tier, QualityTier::Minimal);
        assert_eq!(engine.capability().prior(), QualityTier::Minimal);
    }

    #[test]
    fn accent_rgb_coalesces_to_last_write() {
        let (mut engine, _clock) = engine();
        engine.enqueue("accent-rgb", "255,0,0", PriorityTier::High);
        engine.enqueue("accent-rgb", "0,255,0", PriorityTier::High);
        engine.tick(0.0);
        assert_eq!(
            engine.sink().applied(),
            &[(String::from("accent-rgb"), String::from("0,255,0"))]
        );
        engine.tick(16.0);
        assert_eq!(engine.sink().count("accent-rgb"), 1);
    }

    #[test]
    fn flush_applies_in_priority_order() {
        let (mut engine, _clock) = engine();
        engine.enqueue("c", "3", PriorityTier::Low);
        engine.enqueue("b", "2", PriorityTier::Normal);
        engine.enqueue("a", "1", PriorityTier::Critical);
        engine.tick(0.0);
        let keys: Vec<_> = engine.sink().applied().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn beat_pulse_is_circuit_broken_and_reported() {
        let (mut engine, _clock) = engine();
        let calls = Rc::new(RefCell::new(0_u32));
        let c = Rc::clone(&calls);
        let handle = engine.register("beat-pulse", PriorityTier::High, move |_| {
            *c.borrow_mut() += 1;
            Err(CallbackError::new("no beat data"))
        });

        for i in 0..3_u32 {
            engine.tick(f64::from(i) * 16.0);
        }
        assert_eq!(
            engine.state(handle),
            Some(CallbackState::Disabled(DisableReason::CircuitBreaker))
        );

        let diag = engine.diagnostics();
        assert_eq!(diag.disabled.len(), 1);
        assert_eq!(diag.disabled[0].id, "beat-pulse");
        assert_eq!(diag.disabled[0].reason, DisableReason::CircuitBreaker);
        assert_eq!(diag.disabled[0].consecutive_failures, 3);
        assert_eq!(diag.callback_faults, 3);

        for i in 3..10_u32 {
            let report = engine.tick(f64::from(i) * 16.0);
            assert_eq!(report.callbacks_failed, 0);
        }
        assert_eq!(*calls.borrow(), 3);

        engine.enable(handle).unwrap();
        engine.tick(160.0);
        assert_eq!(*calls.borrow(), 4, "enable restores invocation");
        assert!(engine.diagnostics().disabled.is_empty());
    }

    #[test]
    fn over_budget_tick_skips_low_and_counts_one_overrun() {
        let (mut engine, clock) = engine();
        let ran = Rc::new(RefCell::new(Vec::new()));

        for (id, priority, cost) in [
            ("spectrum", PriorityTier::High, 12.0),
            ("palette", PriorityTier::Normal, 8.0),
            ("sparkle", PriorityTier::Low, 2.0),
        ] {
            let clock = clock.clone();
            let ran = Rc::clone(&ran);
            engine.register(id, priority, move |_| {
                ran.borrow_mut().push(id);
                clock.advance(cost);
                Ok(())
            });
        }

        let before = engine.diagnostics().overrun_count;
        let report = engine.tick(0.0);
        assert_eq!(*ran.borrow(), vec!["spectrum", "palette"]);
        assert!(report.skipped_for_budget >= 1);
        assert_eq!(report.budget_cut, Some(PriorityTier::Low));
        assert_eq!(engine.diagnostics().overrun_count, before + 1);
    }

    #[test]
    fn sustained_load_degrades_to_minimal_and_sheds_low_work() {
        let (mut engine, clock) = engine();
        let reader = engine.quality_reader();
        let heavy_clock = clock.clone();
        engine.register("spectrum", PriorityTier::Critical, move |_| {
            heavy_clock.advance(33.0);
            Ok(())
        });
        let ambient = Rc::new(RefCell::new(0_u32));
        let a = Rc::clone(&ambient);
        engine.register("ambient", PriorityTier::Low, move |_| {
            *a.borrow_mut() += 1;
            Ok(())
        });

        let mut tiers = vec![reader.get().tier];
        for i in 0..200_u32 {
            engine.tick(f64::from(i) * 16.0);
            let tier = reader.get().tier;
            if tiers.last() != Some(&tier) {
                tiers.push(tier);
            }
        }
        assert_eq!(
            tiers,
            [
                QualityTier::High,
                QualityTier::Medium,
                QualityTier::Low,
                QualityTier::Minimal
            ]
        );
        assert_eq!(*ambient.borrow(), 0, "budget or floor always sheds Low work");

        let report = engine.tick(3200.0);
        assert_eq!(report.skipped_for_quality, 1);
    }

    #[test]
    fn callbacks_see_quality_snapshot_and_can_enqueue() {
        let (mut engine, _clock) = engine();
        engine.register("glow", PriorityTier::Normal, |ctx| {
            let intensity = ctx.quality.multiplier;
            ctx.enqueue("glow-intensity", alloc::format!("{intensity}"), PriorityTier::Normal);
            Ok(())
        });
        engine.tick(0.0);
        assert_eq!(engine.sink().latest("glow-intensity"), Some("1"));
    }

    #[test]
    fn enqueuer_outlives_borrow_of_engine() {
        let (mut engine, _clock) = engine();
        let producer = engine.enqueuer();
        producer.enqueue("hover", "1", PriorityTier::Critical);
        assert_eq!(engine.diagnostics().queue_depth, [1, 0, 0, 0]);
        engine.tick(0.0);
        assert_eq!(engine.diagnostics().queue_len(), 0);
        assert_eq!(engine.sink().latest("hover"), Some("1"));
    }

    #[test]
    fn capability_reevaluation_steps_down_under_sustained_overrun() {
        let config = EngineConfig {
            reevaluate_interval_ms: 1000.0,
            step_down_hysteresis_ticks: 10_000,
            step_up_hysteresis_ticks: 20_000,
            ..EngineConfig::new()
        };
        let clock = ManualClock::new(0.0);
        let mut engine = Engine::new(config, desktop(), MemorySink::new(), clock.clone()).unwrap();
        let c = clock.clone();
        engine.register("heavy", PriorityTier::Critical, move |_| {
            c.advance(20.0);
            Ok(())
        });

        for i in 0..=63_u32 {
            engine.tick(f64::from(i) * 16.0);
        }
        assert_eq!(engine.quality_state().tier, QualityTier::Medium);
        assert_eq!(engine.capability().prior(), QualityTier::Medium);
    }

    #[test]
    fn starvation_and_sink_faults_reach_diagnostics() {
        #[derive(Debug)]
        struct Rejecting(MemorySink);
        impl PropertySink for Rejecting {
            fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
                if key == "broken" {
                    return Err(SinkError::new("unknown property"));
                }
                self.0.apply_property(key, value)
            }
        }

        let config = EngineConfig {
            anti_starvation_ticks: Some(2),
            max_batch_size_by_tier: BatchSizes {
                high: 1,
                medium: 1,
                low: 1,
                minimal: 1,
            },
            ..EngineConfig::new()
        };
        let mut engine = Engine::new(
            config,
            desktop(),
            Rejecting(MemorySink::new()),
            ManualClock::new(0.0),
        )
        .unwrap();
        engine.register("press-feedback", PriorityTier::Critical, |ctx| {
            ctx.enqueue("press", "1", PriorityTier::Critical);
            Ok(())
        });
        engine.enqueue("broken", "1", PriorityTier::Critical);
        engine.enqueue("shimmer", "1", PriorityTier::Low);

        // Tick 1 fails "broken"; ticks 2 and 3 apply "press" while "shimmer"
        // waits behind it until it starves.
        let first = engine.tick(0.0);
        assert_eq!(first.flush.failed.len(), 1);
        engine.tick(16.0);
        let third = engine.tick(32.0);
        assert_eq!(third.flush.dropped.len(), 1);

        let diag = engine.diagnostics();
        assert_eq!(diag.sink_failures, 1);
        assert_eq!(diag.starvation_drops, 1);
        assert_eq!(diag.queue_len(), 0);
        assert_eq!(engine.sink().0.count("press"), 2);
        assert_eq!(engine.sink().0.count("shimmer"), 0);
    }

    #[test]
    fn unchanged_prior_does_not_undo_recovery() {
        let mid_range = DeviceSignals {
            logical_cores: Some(4),
            ..desktop()
        };
        let mut engine = Engine::new(
            EngineConfig::new(),
            mid_range,
            MemorySink::new(),
            ManualClock::new(0.0),
        )
        .unwrap();
        let reader = engine.quality_reader();
        assert_eq!(reader.get().tier, QualityTier::Medium);

        // Two minutes idle at 60 Hz spans four re-evaluations.
        let mut tiers = vec![reader.get().tier];
        for i in 0..7200_u32 {
            engine.tick(f64::from(i) * 1000.0 / 60.0);
            let tier = reader.get().tier;
            if tiers.last() != Some(&tier) {
                tiers.push(tier);
            }
        }
        assert_eq!(tiers, [QualityTier::Medium, QualityTier::High]);
        assert_eq!(engine.capability().prior(), QualityTier::Medium);
    }

    #[test]
    fn stale_handle_is_reported() {
        let (mut engine, _clock) = engine();
        let handle = engine.register("x", PriorityTier::Low, |_| Ok(()));
        engine.unregister(handle).unwrap();
        assert_eq!(engine.enable(handle), Err(StaleHandle(handle)));
        assert_eq!(engine.state(handle), None);
    }
}
