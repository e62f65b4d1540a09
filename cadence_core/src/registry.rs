// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registered per-frame callbacks.
//!
//! Callbacks live in slots addressed by generational [`CallbackHandle`]s.
//! Unregistered slots are recycled through a free list, and the generation
//! counter makes handles to a recycled slot fail instead of touching the new
//! occupant.
//!
//! # Lifecycle
//!
//! ```text
//! register ──► Enabled ⇄ Disabled ──► unregister (terminal)
//! ```
//!
//! A callback is disabled either by its producer or by the circuit breaker
//! after repeated faults; [`DisableReason`] records which.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::coordinator::FrameContext;
use crate::error::{CallbackError, StaleHandle};
use crate::priority::PriorityTier;

/// A per-frame computation supplied by a producer.
pub type FrameCallback = Box<dyn FnMut(&FrameContext<'_>) -> Result<(), CallbackError>>;

/// A handle to a registered callback.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle {
    idx: u32,
    generation: u32,
}

impl CallbackHandle {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackHandle({}@gen{})", self.idx, self.generation)
    }
}

/// Why a callback is disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisableReason {
    /// The producer paused it.
    Producer,
    /// It faulted too many times in a row.
    CircuitBreaker,
}

/// Run state of a registered callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackState {
    /// Invoked every tick its priority is admitted and within budget.
    Enabled,
    /// Retained but skipped.
    Disabled(DisableReason),
}

struct Slot {
    id: String,
    priority: PriorityTier,
    callback: Option<FrameCallback>,
    state: CallbackState,
    consecutive_failures: u32,
    faults: u64,
    generation: u32,
    live: bool,
}

/// Read-only view of one registered callback.
#[derive(Clone, Copy, Debug)]
pub struct CallbackInfo<'a> {
    /// Handle of the callback.
    pub handle: CallbackHandle,
    /// Producer-supplied identifier.
    pub id: &'a str,
    /// Execution priority.
    pub priority: PriorityTier,
    /// Current state.
    pub state: CallbackState,
    /// Faults since the last success or re-enable.
    pub consecutive_failures: u32,
    /// Faults over the callback's lifetime.
    pub faults: u64,
}

/// Outcome of recording a callback fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FaultOutcome {
    /// Still enabled; carries the current streak.
    Counted(u32),
    /// The breaker tripped on this fault.
    Tripped(u32),
}

/// Slot storage for callbacks, with stable per-priority execution order.
#[derive(Default)]
pub(crate) struct Registry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    order: [Vec<u32>; 4],
    live: usize,
}

impl Registry {
    pub(crate) fn insert(
        &mut self,
        id: String,
        priority: PriorityTier,
        callback: FrameCallback,
    ) -> CallbackHandle {
        let idx = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.id = id;
            slot.priority = priority;
            slot.callback = Some(callback);
            slot.state = CallbackState::Enabled;
            slot.consecutive_failures = 0;
            slot.faults = 0;
            slot.live = true;
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                id,
                priority,
                callback: Some(callback),
                state: CallbackState::Enabled,
                consecutive_failures: 0,
                faults: 0,
                generation: 0,
                live: true,
            });
            idx
        };
        self.order[priority.index()].push(idx);
        self.live += 1;
        CallbackHandle {
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    pub(crate) fn remove(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        let slot = self.slot_mut(handle)?;
        slot.live = false;
        slot.callback = None;
        slot.id.clear();
        let tier = slot.priority.index();
        self.order[tier].retain(|&i| i != handle.idx);
        self.free_list.push(handle.idx);
        self.live -= 1;
        Ok(())
    }

    pub(crate) fn enable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        let slot = self.slot_mut(handle)?;
        slot.state = CallbackState::Enabled;
        slot.consecutive_failures = 0;
        Ok(())
    }

    pub(crate) fn disable(&mut self, handle: CallbackHandle) -> Result<(), StaleHandle> {
        let slot = self.slot_mut(handle)?;
        if slot.state == CallbackState::Enabled {
            slot.state = CallbackState::Disabled(DisableReason::Producer);
        }
        Ok(())
    }

    pub(crate) fn state(&self, handle: CallbackHandle) -> Option<CallbackState> {
        self.slot(handle).map(|s| s.state)
    }

    pub(crate) fn info(&self, handle: CallbackHandle) -> Option<CallbackInfo<'_>> {
        self.slot(handle).map(|s| Self::info_for(handle, s))
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Slot indices of `priority` in registration order.
    pub(crate) fn order(&self, priority: PriorityTier) -> &[u32] {
        &self.order[priority.index()]
    }

    pub(crate) fn enabled_count(&self, priority: PriorityTier) -> usize {
        self.order[priority.index()]
            .iter()
            .filter(|&&i| self.slots[i as usize].state == CallbackState::Enabled)
            .count()
    }

    pub(crate) fn is_enabled_at(&self, idx: u32) -> bool {
        self.slots[idx as usize].state == CallbackState::Enabled
    }

    pub(crate) fn id_at(&self, idx: u32) -> &str {
        &self.slots[idx as usize].id
    }

    pub(crate) fn handle_at(&self, idx: u32) -> CallbackHandle {
        CallbackHandle {
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    /// Runs the callback in slot `idx`, which must be live.
    pub(crate) fn invoke_at(
        &mut self,
        idx: u32,
        ctx: &FrameContext<'_>,
    ) -> Result<(), CallbackError> {
        match self.slots[idx as usize].callback.as_mut() {
            Some(callback) => invoke(callback, ctx),
            None => Ok(()),
        }
    }

    pub(crate) fn record_success(&mut self, idx: u32) {
        self.slots[idx as usize].consecutive_failures = 0;
    }

    pub(crate) fn record_fault(&mut self, idx: u32, threshold: u32) -> FaultOutcome {
        let slot = &mut self.slots[idx as usize];
        slot.consecutive_failures += 1;
        slot.faults += 1;
        if slot.consecutive_failures >= threshold {
            slot.state = CallbackState::Disabled(DisableReason::CircuitBreaker);
            FaultOutcome::Tripped(slot.consecutive_failures)
        } else {
            FaultOutcome::Counted(slot.consecutive_failures)
        }
    }

    /// Iterates over live callbacks that are currently disabled.
    pub(crate) fn disabled(&self) -> impl Iterator<Item = CallbackInfo<'_>> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            if !slot.live || slot.state == CallbackState::Enabled {
                return None;
            }
            let handle = CallbackHandle {
                idx: u32::try_from(i).ok()?,
                generation: slot.generation,
            };
            Some(Self::info_for(handle, slot))
        })
    }

    fn info_for(handle: CallbackHandle, slot: &Slot) -> CallbackInfo<'_> {
        CallbackInfo {
            handle,
            id: &slot.id,
            priority: slot.priority,
            state: slot.state,
            consecutive_failures: slot.consecutive_failures,
            faults: slot.faults,
        }
    }

    fn slot(&self, handle: CallbackHandle) -> Option<&Slot> {
        self.slots
            .get(handle.idx as usize)
            .filter(|s| s.live && s.generation == handle.generation)
    }

    fn slot_mut(&mut self, handle: CallbackHandle) -> Result<&mut Slot, StaleHandle> {
        self.slots
            .get_mut(handle.idx as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .ok_or(StaleHandle(handle))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "std")]
fn invoke(callback: &mut FrameCallback, ctx: &FrameContext<'_>) -> Result<(), CallbackError> {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    match catch_unwind(AssertUnwindSafe(|| callback(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| String::from(*s))
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("callback panicked"));
            Err(CallbackError::new(message))
        }
    }
}

#[cfg(not(feature = "std"))]
fn invoke(callback: &mut FrameCallback, ctx: &FrameContext<'_>) -> Result<(), CallbackError> {
    callback(ctx)
}
