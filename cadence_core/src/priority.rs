// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority tiers shared by queued updates and frame callbacks.

use core::fmt;

/// Relative urgency of a queued update or a frame callback.
///
/// The ordering is total: `Critical > High > Normal > Low`. It drives both
/// the order in which a flush applies pending updates and the order in which
/// the coordinator runs callbacks within a tick.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityTier {
    /// Decorative or ambient effects.
    Low,
    /// Ordinary visual state.
    Normal,
    /// State that should land this frame if at all possible.
    High,
    /// State the user immediately perceives as broken if delayed.
    Critical,
}

impl PriorityTier {
    /// All tiers in execution order, most urgent first.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Normal, Self::Low];

    /// Returns a dense index in execution order (`Critical` = 0).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }

    /// Returns a short lowercase label for logs and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl fmt::Debug for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
        })
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_total_and_descending_in_all() {
        assert!(PriorityTier::Critical > PriorityTier::High);
        assert!(PriorityTier::High > PriorityTier::Normal);
        assert!(PriorityTier::Normal > PriorityTier::Low);

        for pair in PriorityTier::ALL.windows(2) {
            assert!(pair[0] > pair[1], "ALL must be most urgent first");
        }
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, tier) in PriorityTier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }
}
