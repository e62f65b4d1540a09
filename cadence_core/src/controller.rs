// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed-loop quality control.
//!
//! The [`AdaptiveController`] watches each [`TickReport`] and keeps an
//! exponential moving average of `consumed_ms / target_ms`. When the average
//! stays above the overload ratio for `step_down_hysteresis_ticks`
//! consecutive ticks it steps the quality tier down one level; when it stays
//! below the recovery ratio for the (longer) `step_up_hysteresis_ticks` it
//! steps one level back up. Transitions are always single-step.
//!
//! The controller is the only [`QualityWriter`]. Everything else reads the
//! published [`QualityState`] through a [`QualityReader`].

use core::fmt;

use crate::config::{BatchSizes, EngineConfig};
use crate::coordinator::{TickPlan, TickReport};
use crate::priority::PriorityTier;
use crate::quality::{QualityReader, QualityState, QualityTier, QualityWriter, quality_channel};

/// Why the live tier changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    /// Sustained load above the overload ratio.
    Overload,
    /// Sustained load below the recovery ratio.
    Recovery,
    /// A capability re-evaluation reported a lower prior.
    Prior,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overload => "overload",
            Self::Recovery => "recovery",
            Self::Prior => "prior",
        })
    }
}

/// A published tier transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityChange {
    /// Tick at which the change was published.
    pub tick: u64,
    /// Tier before the change.
    pub from: QualityTier,
    /// Tier after the change.
    pub to: QualityTier,
    /// Multiplier of the new tier.
    pub multiplier: f32,
    /// What triggered the change.
    pub reason: ChangeReason,
}

/// Exponential moving average tracker.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f64,
    alpha: f64,
    initialized: bool,
}

impl Ema {
    /// Smoothing over roughly `window` samples.
    fn with_window(window: u32) -> Self {
        Self {
            value: 0.0,
            alpha: 2.0 / (f64::from(window) + 1.0),
            initialized: false,
        }
    }

    fn update(&mut self, sample: f64) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> f64 {
        self.value
    }
}

/// Owns the live quality tier and adapts it to observed load.
pub struct AdaptiveController {
    writer: QualityWriter,
    load: Ema,
    over_streak: u32,
    under_streak: u32,
    step_down_ticks: u32,
    step_up_ticks: u32,
    overload_ratio: f64,
    recovery_ratio: f64,
    batch_sizes: BatchSizes,
}

impl fmt::Debug for AdaptiveController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveController")
            .field("quality", &self.writer.current())
            .field("load", &self.load.get())
            .field("over_streak", &self.over_streak)
            .field("under_streak", &self.under_streak)
            .finish_non_exhaustive()
    }
}

impl AdaptiveController {
    /// Creates a controller publishing `initial` as the live tier.
    #[must_use]
    pub fn new(config: &EngineConfig, initial: QualityTier) -> Self {
        let (writer, _) = quality_channel(QualityState::new(initial, 0));
        Self {
            writer,
            load: Ema::with_window(config.ema_window_ticks),
            over_streak: 0,
            under_streak: 0,
            step_down_ticks: config.step_down_hysteresis_ticks,
            step_up_ticks: config.step_up_hysteresis_ticks,
            overload_ratio: config.overload_ratio,
            recovery_ratio: config.recovery_ratio,
            batch_sizes: config.max_batch_size_by_tier,
        }
    }

    /// Returns the live quality snapshot.
    #[must_use]
    pub fn quality(&self) -> QualityState {
        self.writer.current()
    }

    /// Returns a reader of the live quality state.
    #[must_use]
    pub fn reader(&self) -> QualityReader {
        self.writer.reader()
    }

    /// Returns the smoothed load ratio.
    #[must_use]
    pub fn smoothed_load(&self) -> f64 {
        self.load.get()
    }

    /// Lowest callback priority admitted at the live tier.
    #[must_use]
    pub fn admission_floor(&self) -> PriorityTier {
        match self.writer.current().tier {
            QualityTier::High | QualityTier::Medium => PriorityTier::Low,
            QualityTier::Low => PriorityTier::Normal,
            QualityTier::Minimal => PriorityTier::High,
        }
    }

    /// Flush cap at the live tier.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.batch_sizes.for_tier(self.writer.current().tier)
    }

    /// Builds the coordinator's instructions for the next tick.
    #[must_use]
    pub fn plan(&self) -> TickPlan {
        TickPlan {
            floor: self.admission_floor(),
            max_batch_size: self.max_batch_size(),
            quality: self.writer.current(),
        }
    }

    /// Feeds one completed tick into the loop. Returns the transition, if the
    /// tick caused one.
    pub fn observe(&mut self, report: &TickReport) -> Option<QualityChange> {
        self.load.update(report.load());
        let load = self.load.get();

        if load > self.overload_ratio {
            self.over_streak += 1;
            self.under_streak = 0;
        } else if load < self.recovery_ratio {
            self.under_streak += 1;
            self.over_streak = 0;
        } else {
            self.over_streak = 0;
            self.under_streak = 0;
        }

        let tier = self.writer.current().tier;
        if self.over_streak >= self.step_down_ticks {
            if let Some(to) = tier.step_down() {
                return Some(self.publish(to, report.tick, ChangeReason::Overload));
            }
            // Already at the floor; keep counting from zero.
            self.over_streak = 0;
        } else if self.under_streak >= self.step_up_ticks {
            if let Some(to) = tier.step_up() {
                return Some(self.publish(to, report.tick, ChangeReason::Recovery));
            }
            self.under_streak = 0;
        }
        None
    }

    /// Applies a capability prior. A prior below the live tier steps down by
    /// one level; anything else is ignored.
    pub fn apply_prior(&mut self, prior: QualityTier, tick: u64) -> Option<QualityChange> {
        let tier = self.writer.current().tier;
        if prior >= tier {
            return None;
        }
        let to = tier.step_down()?;
        Some(self.publish(to, tick, ChangeReason::Prior))
    }

    fn publish(&mut self, to: QualityTier, tick: u64, reason: ChangeReason) -> QualityChange {
        let from = self.writer.current().tier;
        let state = QualityState::new(to, tick);
        self.writer.publish(state);
        self.over_streak = 0;
        self.under_streak = 0;
        tracing::info!(
            tick,
            %from,
            %to,
            multiplier = state.multiplier,
            %reason,
            smoothed_load = self.load.get(),
            "quality tier changed"
        );
        QualityChange {
            tick,
            from,
            to,
            multiplier: state.multiplier,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::queue::FlushReport;

    fn report(tick: u64, consumed_ms: f64) -> TickReport {
        TickReport {
            tick,
            delta_ms: 16.0,
            target_ms: 16.0,
            consumed_ms,
            overrun: consumed_ms > 16.0,
            overrun_count: 0,
            callbacks_run: 0,
            callbacks_failed: 0,
            skipped_for_budget: 0,
            skipped_for_quality: 0,
            budget_cut: None,
            flush: FlushReport::default(),
        }
    }

    #[test]
    fn sustained_overload_steps_down_one_tier_per_window() {
        let config = EngineConfig::new();
        let mut ctl = AdaptiveController::new(&config, QualityTier::High);
        let reader = ctl.reader();

        let mut changes = Vec::new();
        for tick in 1..=200 {
            if let Some(change) = ctl.observe(&report(tick, 32.0)) {
                changes.push(change);
            }
        }

        let steps: Vec<_> = changes.iter().map(|c| (c.tick, c.from, c.to)).collect();
        assert_eq!(
            steps,
            [
                (30, QualityTier::High, QualityTier::Medium),
                (60, QualityTier::Medium, QualityTier::Low),
                (90, QualityTier::Low, QualityTier::Minimal),
            ]
        );
        for pair in changes.windows(2) {
            assert!(
                pair[1].tick - pair[0].tick >= u64::from(config.step_down_hysteresis_ticks),
                "at most one step per hysteresis window"
            );
        }
        assert_eq!(reader.get().tier, QualityTier::Minimal);
        assert_eq!(reader.get().multiplier, 0.15);
    }

    #[test]
    fn recovery_is_slower_than_degradation() {
        let config = EngineConfig::new();
        let mut ctl = AdaptiveController::new(&config, QualityTier::High);

        let mut down_at = None;
        for tick in 1..=100 {
            if ctl.observe(&report(tick, 32.0)).is_some() {
                down_at = Some(tick);
                break;
            }
        }
        let down_ticks = down_at.expect("overload steps down");
        assert_eq!(ctl.quality().tier, QualityTier::Medium);

        let mut up_ticks = None;
        for n in 1..=1000 {
            if let Some(change) = ctl.observe(&report(down_ticks + n, 1.0)) {
                assert_eq!(change.reason, ChangeReason::Recovery);
                up_ticks = Some(n);
                break;
            }
        }
        let up_ticks = up_ticks.expect("idle load steps back up");
        assert!(up_ticks > down_ticks, "{up_ticks} > {down_ticks}");
        assert_eq!(ctl.quality().tier, QualityTier::High);
    }

    #[test]
    fn borderline_load_holds_tier() {
        let mut ctl = AdaptiveController::new(&EngineConfig::new(), QualityTier::Medium);
        for tick in 1..=1000 {
            assert!(ctl.observe(&report(tick, 12.8)).is_none());
        }
        assert_eq!(ctl.quality().tier, QualityTier::Medium);
    }

    #[test]
    fn interrupted_overload_does_not_step() {
        let mut ctl = AdaptiveController::new(&EngineConfig::new(), QualityTier::High);
        // Short heavy bursts push the average over 1.0 for about 20 ticks;
        // the quiet stretch pulls it back under before the window fills.
        let mut tick = 0;
        let mut peak = 0.0_f64;
        for _ in 0..20 {
            for _ in 0..10 {
                tick += 1;
                assert!(ctl.observe(&report(tick, 20.0)).is_none(), "tick {tick}");
                peak = peak.max(ctl.smoothed_load());
            }
            for _ in 0..20 {
                tick += 1;
                assert!(ctl.observe(&report(tick, 8.0)).is_none(), "tick {tick}");
            }
        }
        assert!(peak > 1.0, "bursts overload: {peak}");
        assert_eq!(ctl.quality().tier, QualityTier::High);
    }

    #[test]
    fn admission_floor_and_batch_cap_follow_tier() {
        let config = EngineConfig::new();
        let cases = [
            (QualityTier::High, PriorityTier::Low, 256),
            (QualityTier::Medium, PriorityTier::Low, 128),
            (QualityTier::Low, PriorityTier::Normal, 64),
            (QualityTier::Minimal, PriorityTier::High, 32),
        ];
        for (tier, floor, cap) in cases {
            let ctl = AdaptiveController::new(&config, tier);
            assert_eq!(ctl.admission_floor(), floor, "{tier:?}");
            assert_eq!(ctl.max_batch_size(), cap, "{tier:?}");
            let plan = ctl.plan();
            assert_eq!(plan.quality.tier, tier);
        }
    }

    #[test]
    fn prior_only_steps_down_one_level() {
        let mut ctl = AdaptiveController::new(&EngineConfig::new(), QualityTier::High);
        assert!(ctl.apply_prior(QualityTier::High, 5).is_none());

        let change = ctl.apply_prior(QualityTier::Minimal, 6).expect("lower prior");
        assert_eq!(change.from, QualityTier::High);
        assert_eq!(change.to, QualityTier::Medium);
        assert_eq!(change.reason, ChangeReason::Prior);
        assert_eq!(ctl.quality().updated_at_tick, 6);

        // A higher prior never raises the live tier.
        ctl.apply_prior(QualityTier::Minimal, 7);
        assert!(ctl.apply_prior(QualityTier::High, 8).is_none());
        assert_eq!(ctl.quality().tier, QualityTier::Low);
    }

    #[test]
    fn minimal_tier_stays_put_under_overload() {
        let mut ctl = AdaptiveController::new(&EngineConfig::new(), QualityTier::Minimal);
        for tick in 1..=500 {
            assert!(ctl.observe(&report(tick, 64.0)).is_none());
        }
    }
}
