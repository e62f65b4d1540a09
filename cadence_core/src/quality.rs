// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quality tiers and the shared quality snapshot.
//!
//! [`QualityState`] is the one piece of engine state that every producer may
//! read. It is published through a single [`QualityWriter`] (held by the
//! [`AdaptiveController`](crate::controller::AdaptiveController)) and any
//! number of [`QualityReader`]s. Readers poll the current snapshot once per
//! invocation; the value may change between two reads, and producers must
//! treat it as advisory.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

/// A discrete degradation level.
///
/// Tiers are ordered from richest (`High`) to sparest (`Minimal`); the
/// derived ordering compares by richness, so `High > Minimal`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    /// Only essential visuals.
    Minimal,
    /// Reduced visuals.
    Low,
    /// Most visuals at reduced intensity.
    Medium,
    /// Full visual richness.
    High,
}

impl QualityTier {
    /// All tiers, richest first.
    pub const ALL: [Self; 4] = [Self::High, Self::Medium, Self::Low, Self::Minimal];

    /// Returns the intensity multiplier producers apply to optional work.
    #[must_use]
    pub const fn multiplier(self) -> f32 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.7,
            Self::Low => 0.4,
            Self::Minimal => 0.15,
        }
    }

    /// Returns the next sparser tier, or `None` at [`Minimal`](Self::Minimal).
    #[must_use]
    pub const fn step_down(self) -> Option<Self> {
        match self {
            Self::High => Some(Self::Medium),
            Self::Medium => Some(Self::Low),
            Self::Low => Some(Self::Minimal),
            Self::Minimal => None,
        }
    }

    /// Returns the next richer tier, or `None` at [`High`](Self::High).
    #[must_use]
    pub const fn step_up(self) -> Option<Self> {
        match self {
            Self::High => None,
            Self::Medium => Some(Self::High),
            Self::Low => Some(Self::Medium),
            Self::Minimal => Some(Self::Low),
        }
    }

    /// Returns a dense index, richest first (`High` = 0).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Minimal => 3,
        }
    }

    /// Returns a short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }
}

impl fmt::Debug for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Minimal => "Minimal",
        })
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of the live quality level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityState {
    /// Current tier.
    pub tier: QualityTier,
    /// Intensity multiplier in `[0, 1]`, derived from `tier`.
    pub multiplier: f32,
    /// Tick at which this state was published.
    pub updated_at_tick: u64,
}

impl QualityState {
    /// Creates the state for `tier`, published at `tick`.
    #[must_use]
    pub const fn new(tier: QualityTier, tick: u64) -> Self {
        Self {
            tier,
            multiplier: tier.multiplier(),
            updated_at_tick: tick,
        }
    }
}

/// The single publishing end of the shared [`QualityState`].
///
/// Not `Clone`: there is exactly one writer per engine.
#[derive(Debug)]
pub struct QualityWriter {
    cell: Rc<Cell<QualityState>>,
}

/// A read-only view of the shared [`QualityState`].
#[derive(Clone, Debug)]
pub struct QualityReader {
    cell: Rc<Cell<QualityState>>,
}

/// Creates a connected writer/reader pair seeded with `initial`.
#[must_use]
pub fn quality_channel(initial: QualityState) -> (QualityWriter, QualityReader) {
    let cell = Rc::new(Cell::new(initial));
    (
        QualityWriter {
            cell: Rc::clone(&cell),
        },
        QualityReader { cell },
    )
}

impl QualityWriter {
    /// Publishes a new snapshot.
    pub fn publish(&mut self, state: QualityState) {
        self.cell.set(state);
    }

    /// Returns the currently published snapshot.
    #[must_use]
    pub fn current(&self) -> QualityState {
        self.cell.get()
    }

    /// Creates another reader for the same cell.
    #[must_use]
    pub fn reader(&self) -> QualityReader {
        QualityReader {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl QualityReader {
    /// Returns the latest published snapshot.
    #[must_use]
    pub fn get(&self) -> QualityState {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_single_and_bounded() {
        assert_eq!(QualityTier::High.step_down(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::Low.step_down(), Some(QualityTier::Minimal));
        assert_eq!(QualityTier::Minimal.step_down(), None);
        assert_eq!(QualityTier::Minimal.step_up(), Some(QualityTier::Low));
        assert_eq!(QualityTier::High.step_up(), None);
    }

    #[test]
    fn multiplier_decreases_with_tier() {
        for pair in QualityTier::ALL.windows(2) {
            assert!(pair[0].multiplier() > pair[1].multiplier());
        }
        assert_eq!(QualityTier::High.multiplier(), 1.0);
        assert_eq!(QualityTier::Minimal.multiplier(), 0.15);
    }

    #[test]
    fn readers_observe_published_state() {
        let (mut writer, reader) = quality_channel(QualityState::new(QualityTier::High, 0));
        let other = writer.reader();
        assert_eq!(reader.get().tier, QualityTier::High);

        writer.publish(QualityState::new(QualityTier::Low, 12));
        assert_eq!(reader.get().tier, QualityTier::Low);
        assert_eq!(other.get().updated_at_tick, 12);
        assert_eq!(other.get().multiplier, 0.4);
    }
}
