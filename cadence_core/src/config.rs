// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.
//!
//! [`EngineConfig`] is set once at construction. [`EngineConfig::validate`]
//! runs inside [`Engine::new`](crate::engine::Engine::new), so an engine
//! never starts with undefined budget semantics.

use crate::error::ConfigError;
use crate::quality::QualityTier;

/// Maximum number of updates flushed per tick, per quality tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSizes {
    /// Cap while at [`QualityTier::High`].
    pub high: usize,
    /// Cap while at [`QualityTier::Medium`].
    pub medium: usize,
    /// Cap while at [`QualityTier::Low`].
    pub low: usize,
    /// Cap while at [`QualityTier::Minimal`].
    pub minimal: usize,
}

impl BatchSizes {
    /// Returns the cap for `tier`.
    #[must_use]
    pub const fn for_tier(&self, tier: QualityTier) -> usize {
        match tier {
            QualityTier::High => self.high,
            QualityTier::Medium => self.medium,
            QualityTier::Low => self.low,
            QualityTier::Minimal => self.minimal,
        }
    }
}

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Frame budget in milliseconds.
    pub target_frame_ms: f64,
    /// Upper clamp for the delta handed to callbacks, in milliseconds.
    pub max_delta_ms: f64,
    /// Flush cap per quality tier.
    pub max_batch_size_by_tier: BatchSizes,
    /// Ticks a `Low` update may stay pending before it is dropped.
    /// `None` disables the drop.
    pub anti_starvation_ticks: Option<u64>,
    /// Consecutive overloaded ticks before stepping quality down.
    pub step_down_hysteresis_ticks: u32,
    /// Consecutive relaxed ticks before stepping quality up.
    pub step_up_hysteresis_ticks: u32,
    /// Nominal window of the load moving average, in ticks.
    pub ema_window_ticks: u32,
    /// Average budget usage above which a tick counts as overloaded.
    pub overload_ratio: f64,
    /// Average budget usage below which a tick counts as relaxed.
    pub recovery_ratio: f64,
    /// Consecutive faults before a callback's circuit breaker trips.
    pub failure_threshold: u32,
    /// Clean ticks needed to forgive one recorded overrun.
    pub overrun_decay_ticks: u32,
    /// Period of capability re-evaluation, in milliseconds.
    pub reevaluate_interval_ms: f64,
}

impl EngineConfig {
    /// Defaults for a 60 Hz display with no starvation drop.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target_frame_ms: 1000.0 / 60.0,
            max_delta_ms: 250.0,
            max_batch_size_by_tier: BatchSizes {
                high: 256,
                medium: 128,
                low: 64,
                minimal: 32,
            },
            anti_starvation_ticks: None,
            step_down_hysteresis_ticks: 30,
            step_up_hysteresis_ticks: 180,
            ema_window_ticks: 60,
            overload_ratio: 1.0,
            recovery_ratio: 0.6,
            failure_threshold: 3,
            overrun_decay_ticks: 120,
            reevaluate_interval_ms: 30_000.0,
        }
    }

    /// Tighter caps and an anti-starvation drop, for constrained devices.
    #[must_use]
    pub const fn constrained() -> Self {
        let mut config = Self::new();
        config.max_batch_size_by_tier = BatchSizes {
            high: 96,
            medium: 48,
            low: 24,
            minimal: 12,
        };
        config.anti_starvation_ticks = Some(240);
        config.step_down_hysteresis_ticks = 20;
        config
    }

    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_frame_ms.is_finite() && self.target_frame_ms > 0.0) {
            return Err(ConfigError::TargetFrame(self.target_frame_ms));
        }
        if !(self.max_delta_ms.is_finite() && self.max_delta_ms > 0.0) {
            return Err(ConfigError::MaxDelta(self.max_delta_ms));
        }
        for tier in QualityTier::ALL {
            if self.max_batch_size_by_tier.for_tier(tier) == 0 {
                return Err(ConfigError::ZeroBatchSize(tier));
            }
        }
        if self.anti_starvation_ticks == Some(0) {
            return Err(ConfigError::ZeroStarvationWindow);
        }
        for (name, value) in [
            ("step-down hysteresis", self.step_down_hysteresis_ticks),
            ("step-up hysteresis", self.step_up_hysteresis_ticks),
            ("moving-average window", self.ema_window_ticks),
            ("failure threshold", self.failure_threshold),
            ("overrun decay window", self.overrun_decay_ticks),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroWindow(name));
            }
        }
        if self.step_up_hysteresis_ticks <= self.step_down_hysteresis_ticks {
            return Err(ConfigError::Hysteresis {
                down: self.step_down_hysteresis_ticks,
                up: self.step_up_hysteresis_ticks,
            });
        }
        let ratios_ok = self.overload_ratio.is_finite()
            && self.recovery_ratio.is_finite()
            && self.recovery_ratio > 0.0
            && self.recovery_ratio < self.overload_ratio;
        if !ratios_ok {
            return Err(ConfigError::Ratios {
                overload: self.overload_ratio,
                recovery: self.recovery_ratio,
            });
        }
        if !(self.reevaluate_interval_ms.is_finite() && self.reevaluate_interval_ms > 0.0) {
            return Err(ConfigError::ReevaluateInterval(self.reevaluate_interval_ms));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
