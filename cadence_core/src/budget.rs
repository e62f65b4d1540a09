// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tick frame budget accounting and recent-tick history.
//!
//! [`FrameBudget`] is reset at the start of every tick and charged for each
//! callback and for the flush. Its overrun counter survives across ticks and
//! decays after sustained clean ticks, which makes it a slow-moving load
//! signal.
//!
//! [`BudgetHistory`] keeps the last `N` ticks in a ring buffer and condenses
//! them into a [`BudgetSummary`] for the
//! [`CapabilityAnalyzer`](crate::capability::CapabilityAnalyzer).

use alloc::string::String;

/// Budget accounting for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBudget {
    /// Frame budget in milliseconds.
    pub target_ms: f64,
    /// Milliseconds consumed so far this tick.
    pub consumed_ms: f64,
    /// Decaying count of overrun ticks.
    pub overrun_count: u32,
    clean_streak: u32,
    decay_ticks: u32,
}

impl FrameBudget {
    /// Creates a budget of `target_ms` that forgives one overrun after every
    /// `decay_ticks` consecutive clean ticks.
    #[must_use]
    pub const fn new(target_ms: f64, decay_ticks: u32) -> Self {
        Self {
            target_ms,
            consumed_ms: 0.0,
            overrun_count: 0,
            clean_streak: 0,
            decay_ticks,
        }
    }

    /// Starts a new tick.
    pub fn reset(&mut self) {
        self.consumed_ms = 0.0;
    }

    /// Charges `ms` of work to this tick. Negative readings are ignored.
    pub fn charge(&mut self, ms: f64) {
        if ms > 0.0 {
            self.consumed_ms += ms;
        }
    }

    /// Returns `true` once more than the whole budget has been consumed.
    #[must_use]
    pub fn exceeded(&self) -> bool {
        self.consumed_ms > self.target_ms
    }

    /// Returns consumed time as a fraction of the budget.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.consumed_ms / self.target_ms
    }

    /// Closes the tick, updating the overrun counter. Returns whether the
    /// tick overran.
    pub fn settle(&mut self) -> bool {
        if self.exceeded() {
            self.overrun_count = self.overrun_count.saturating_add(1);
            self.clean_streak = 0;
            return true;
        }
        self.clean_streak += 1;
        if self.clean_streak >= self.decay_ticks {
            self.overrun_count = self.overrun_count.saturating_sub(1);
            self.clean_streak = 0;
        }
        false
    }
}

/// Aggregate of recent ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BudgetSummary {
    /// Ticks in the window.
    pub samples: usize,
    /// Mean consumed milliseconds.
    pub mean_ms: f64,
    /// Largest consumed milliseconds.
    pub peak_ms: f64,
    /// Mean consumed fraction of the budget.
    pub mean_ratio: f64,
    /// Ticks in the window that overran.
    pub overrun_ticks: usize,
    /// Current decaying overrun counter.
    pub overrun_count: u32,
}

impl BudgetSummary {
    /// Returns the fraction of windowed ticks that overran.
    #[must_use]
    pub fn overrun_fraction(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.overrun_ticks as f64 / self.samples as f64
        }
    }
}

/// Rolling record of the last `N` ticks.
#[derive(Debug)]
pub struct BudgetHistory<const N: usize> {
    consumed_ms: [f64; N],
    overran: [bool; N],
    cursor: usize,
    filled: usize,
}

impl<const N: usize> Default for BudgetHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BudgetHistory<N> {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            consumed_ms: [0.0; N],
            overran: [false; N],
            cursor: 0,
            filled: 0,
        }
    }

    /// Records one closed tick.
    pub fn record(&mut self, consumed_ms: f64, overran: bool) {
        if N == 0 {
            return;
        }
        self.consumed_ms[self.cursor] = consumed_ms;
        self.overran[self.cursor] = overran;
        self.cursor = (self.cursor + 1) % N;
        self.filled = (self.filled + 1).min(N);
    }

    /// Summarizes the window against `budget`.
    #[must_use]
    pub fn summary(&self, budget: &FrameBudget) -> BudgetSummary {
        if self.filled == 0 {
            return BudgetSummary {
                overrun_count: budget.overrun_count,
                ..BudgetSummary::default()
            };
        }
        let mut total = 0.0;
        let mut peak: f64 = 0.0;
        let mut overrun_ticks = 0;
        for i in 0..self.filled {
            let ms = self.consumed_ms[i];
            total += ms;
            if ms > peak {
                peak = ms;
            }
            if self.overran[i] {
                overrun_ticks += 1;
            }
        }
        let mean_ms = total / self.filled as f64;
        BudgetSummary {
            samples: self.filled,
            mean_ms,
            peak_ms: peak,
            mean_ratio: mean_ms / budget.target_ms,
            overrun_ticks,
            overrun_count: budget.overrun_count,
        }
    }

    /// Returns consumed milliseconds oldest→newest.
    #[must_use]
    pub fn consumed(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let start = if self.filled < N { 0 } else { self.cursor };
        let mut i = 0;
        while i < self.filled {
            out[i] = self.consumed_ms[(start + i) % N];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline of consumed time over the window.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(self.filled);
        let span = max_ms - min_ms;
        for v in &self.consumed()[..self.filled] {
            let t = if span > 0.0 {
                (v.clamp(min_ms, max_ms) - min_ms) / span
            } else {
                0.0
            };
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level.min(LEVELS.len() - 1)] as char);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_counts_overruns_once_per_tick() {
        let mut budget = FrameBudget::new(10.0, 3);
        budget.charge(6.0);
        budget.charge(6.0);
        assert!(budget.exceeded());
        assert!(budget.settle());
        assert_eq!(budget.overrun_count, 1);

        budget.reset();
        assert_eq!(budget.consumed_ms, 0.0);
        assert_eq!(budget.overrun_count, 1, "overrun count persists across ticks");
    }

    #[test]
    fn overrun_count_decays_after_clean_streak() {
        let mut budget = FrameBudget::new(10.0, 3);
        budget.charge(11.0);
        budget.settle();
        budget.charge(11.0);
        budget.settle();
        assert_eq!(budget.overrun_count, 2);

        for _ in 0..3 {
            budget.reset();
            budget.charge(1.0);
            assert!(!budget.settle());
        }
        assert_eq!(budget.overrun_count, 1);

        for _ in 0..6 {
            budget.reset();
            budget.settle();
        }
        assert_eq!(budget.overrun_count, 0, "decay saturates at zero");
    }

    #[test]
    fn negative_charge_is_ignored() {
        let mut budget = FrameBudget::new(10.0, 3);
        budget.charge(-5.0);
        assert_eq!(budget.consumed_ms, 0.0);
    }

    #[test]
    fn summary_reflects_window() {
        let mut history = BudgetHistory::<4>::new();
        let budget = FrameBudget::new(10.0, 60);
        assert_eq!(history.summary(&budget).samples, 0);

        for ms in [5.0, 15.0, 10.0, 20.0, 30.0] {
            history.record(ms, ms > 10.0);
        }
        let summary = history.summary(&budget);
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.peak_ms, 30.0);
        assert_eq!(summary.mean_ms, 18.75);
        assert_eq!(summary.overrun_ticks, 3);
        assert!((summary.mean_ratio - 1.875).abs() < 1e-9);
        assert!((summary.overrun_fraction() - 0.75).abs() < 1e-9);
        assert_eq!(history.consumed(), [15.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn sparkline_has_one_glyph_per_sample() {
        let mut history = BudgetHistory::<8>::new();
        history.record(0.0, false);
        history.record(33.0, true);
        let line = history.sparkline_ascii(0.0, 33.0);
        assert_eq!(line, " @");
    }
}
