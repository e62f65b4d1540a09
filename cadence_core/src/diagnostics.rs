// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-in-time snapshot for operational tooling.

use alloc::string::String;
use alloc::vec::Vec;

use crate::priority::PriorityTier;
use crate::quality::QualityTier;
use crate::registry::{CallbackHandle, CallbackInfo, CallbackState, DisableReason};

/// A callback that is registered but not running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisabledCallback {
    /// Handle of the callback.
    pub handle: CallbackHandle,
    /// Producer-supplied identifier.
    pub id: String,
    /// Callback priority.
    pub priority: PriorityTier,
    /// Who disabled it.
    pub reason: DisableReason,
    /// Fault streak at the time of the snapshot.
    pub consecutive_failures: u32,
}

impl DisabledCallback {
    pub(crate) fn from_info(info: &CallbackInfo<'_>) -> Option<Self> {
        let CallbackState::Disabled(reason) = info.state else {
            return None;
        };
        Some(Self {
            handle: info.handle,
            id: info.id.into(),
            priority: info.priority,
            reason,
            consecutive_failures: info.consecutive_failures,
        })
    }
}

/// Engine state as seen from outside.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    /// Completed ticks.
    pub tick: u64,
    /// Live quality tier.
    pub tier: QualityTier,
    /// Live quality multiplier.
    pub multiplier: f32,
    /// Decaying overrun counter.
    pub overrun_count: u32,
    /// Pending keys per priority, indexed by [`PriorityTier::index`].
    pub queue_depth: [usize; 4],
    /// Callbacks currently disabled, by producer or circuit breaker.
    pub disabled: Vec<DisabledCallback>,
    /// Registered callbacks, enabled or not.
    pub registered: usize,
    /// Lifetime count of starved `Low` updates dropped.
    pub starvation_drops: u64,
    /// Lifetime count of sink rejections.
    pub sink_failures: u64,
    /// Lifetime count of callback faults.
    pub callback_faults: u64,
}

impl Diagnostics {
    /// Total pending keys.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue_depth.iter().sum()
    }

    /// Returns the disabled entries tripped by the circuit breaker.
    pub fn circuit_broken(&self) -> impl Iterator<Item = &DisabledCallback> + '_ {
        self.disabled
            .iter()
            .filter(|d| d.reason == DisableReason::CircuitBreaker)
    }
}
