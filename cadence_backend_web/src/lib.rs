// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web host for cadence.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`StyleSink`]: CSS custom-property render surface
//! - [`PerformanceClock`]: `performance.now()` clock
//! - [`probe_device_signals`]: static signals for the capability analyzer
//!
//! [`drive`] wires them together for the common case of one engine per page.

#![no_std]

extern crate alloc;

mod raf;
mod sink;

use alloc::rc::Rc;
use core::cell::RefCell;

pub use raf::RafLoop;
pub use sink::StyleSink;

use cadence_core::capability::{DeviceClass, DeviceSignals};
use cadence_core::engine::Engine;
use cadence_core::sink::PropertySink;
use cadence_core::time::Clock;

/// Milliseconds on the `performance.now()` timeline, the same timeline
/// `requestAnimationFrame` timestamps use.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        raf::performance_now()
    }
}

/// Reads what the browser exposes about the device.
///
/// Memory class and graphics acceleration are not probed and stay `None`.
#[must_use]
pub fn probe_device_signals() -> DeviceSignals {
    let Some(window) = web_sys::window() else {
        tracing::warn!("no window; using unknown device signals");
        return DeviceSignals::default();
    };
    let navigator = window.navigator();

    let cores = navigator.hardware_concurrency();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "hardwareConcurrency is a small positive integer"
    )]
    let logical_cores = (cores.is_finite() && cores >= 1.0).then(|| cores as u32);

    let class = navigator
        .user_agent()
        .map_or(DeviceClass::Unknown, |ua| classify_user_agent(&ua));

    let reduced_motion = window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .is_some_and(|query| query.matches());

    DeviceSignals {
        logical_cores,
        memory_gb: None,
        gpu_accelerated: None,
        class,
        reduced_motion,
    }
}

/// Classifies a user-agent string into a coarse form factor.
#[must_use]
pub fn classify_user_agent(ua: &str) -> DeviceClass {
    if ua.is_empty() {
        return DeviceClass::Unknown;
    }
    if ua.contains("iPad") || ua.contains("Tablet") {
        return DeviceClass::Tablet;
    }
    if ua.contains("Mobi") || ua.contains("iPhone") {
        return DeviceClass::Mobile;
    }
    if ua.contains("Android") {
        // Android tablets omit the "Mobile" token.
        return DeviceClass::Tablet;
    }
    DeviceClass::Desktop
}

/// Starts a [`RafLoop`] that ticks `engine` once per animation frame.
///
/// The loop stops when the returned `RafLoop` is dropped.
pub fn drive<S: PropertySink + 'static>(engine: Rc<RefCell<Engine<S>>>) -> RafLoop {
    let raf = RafLoop::new(move |timestamp_ms| {
        engine.borrow_mut().tick(timestamp_ms);
    });
    raf.start();
    raf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agents_classify() {
        let cases = [
            (
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
                DeviceClass::Mobile,
            ),
            (
                "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0 Mobile Safari/537.36",
                DeviceClass::Mobile,
            ),
            (
                "Mozilla/5.0 (Linux; Android 13; SM-X700) Chrome/120.0 Safari/537.36",
                DeviceClass::Tablet,
            ),
            (
                "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)",
                DeviceClass::Tablet,
            ),
            (
                "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/121.0",
                DeviceClass::Desktop,
            ),
            ("", DeviceClass::Unknown),
        ];
        for (ua, class) in cases {
            assert_eq!(classify_user_agent(ua), class, "{ua}");
        }
    }
}
