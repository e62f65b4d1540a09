// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-budgeted coordination of visual-state updates.
//!
//! `cadence_core` lets many independent producers (audio analysis, color
//! processing, interaction feedback) drive one render surface without each
//! running its own timer. Producers either enqueue keyed values or register
//! per-frame callbacks; one tick per display refresh runs the callbacks in
//! priority order inside a frame budget, then flushes the coalesced writes.
//! When the budget is routinely exceeded, quality degrades one tier at a
//! time instead of stuttering. It is `no_std` compatible (with `alloc`) and
//! strictly single-threaded.
//!
//! # Architecture
//!
//! ```text
//!   Host (display refresh)
//!       │ tick(ts)
//!       ▼
//!   FrameCoordinator ──► callbacks (Critical → Low, within budget)
//!       │                      │ enqueue
//!       │                      ▼
//!       ├──────────────► UpdateQueue::take_batch() ──► PropertySink
//!       │
//!       ▼
//!   TickReport ──► AdaptiveController::observe() ──► QualityState
//!                          ▲                              │
//!   CapabilityAnalyzer ────┘ prior            producers read (advisory)
//! ```
//!
//! **[`queue`]** — Coalescing, priority-ordered store of pending property
//! writes. Last write wins per key; flushes are capped and deterministic.
//!
//! **[`coordinator`]** — The single tick loop: delta clamping, tier-ordered
//! callback execution, budget enforcement and the per-callback circuit
//! breaker.
//!
//! **[`controller`]** — Smoothed load tracking with asymmetric hysteresis
//! that owns the live [`QualityState`](quality::QualityState).
//!
//! **[`capability`]** — Static device assessment for the starting tier, and
//! low-frequency re-evaluation.
//!
//! **[`engine`]** — [`Engine`](engine::Engine), the façade producers and
//! hosts talk to.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! Faults and decisions are also logged through [`tracing`]; install a
//! subscriber in the host to see them.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies,
//!   [`StdClock`](time::StdClock), and catching callback panics as faults.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod budget;
pub mod capability;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod priority;
pub mod quality;
pub mod queue;
pub mod registry;
pub mod sink;
pub mod time;
pub mod trace;
