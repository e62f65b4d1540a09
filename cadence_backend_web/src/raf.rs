// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation-frame driver.
//!
//! The browser hands every `requestAnimationFrame` callback a
//! [`DOMHighResTimeStamp`][mdn]: milliseconds on the `performance.now()`
//! timeline. [`RafLoop`] forwards that value untouched, so it can be passed
//! straight to [`Engine::tick`](cadence_core::engine::Engine::tick).
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Bound as globals so a frame never has to look up `window` or
// `window.performance`.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Calls `on_frame` with the timestamp of every animation frame while active.
///
/// A new loop is idle. [`start`](Self::start) schedules the first frame and
/// each delivered frame schedules the next one, until [`stop`](Self::stop)
/// or drop.
pub struct RafLoop {
    shared: Rc<Shared>,
}

struct Shared {
    /// Registered with the browser; reschedules itself, so it lives apart
    /// from `on_frame` to keep the two borrows disjoint.
    trampoline: RefCell<Option<FrameClosure>>,
    on_frame: RefCell<Box<dyn FnMut(f64)>>,
    delivered: Cell<u64>,
    active: Cell<bool>,
    /// Handle of the outstanding request, for cancellation.
    pending: Cell<i32>,
}

impl Shared {
    fn schedule(&self, trampoline: &FrameClosure) {
        self.pending
            .set(request_animation_frame(trampoline.as_ref().unchecked_ref()));
    }

    fn deliver(&self, timestamp_ms: f64) {
        if !self.active.get() {
            return;
        }
        self.delivered.set(self.delivered.get() + 1);
        self.on_frame.borrow_mut()(timestamp_ms);

        if self.active.get()
            && let Some(trampoline) = self.trampoline.borrow().as_ref()
        {
            self.schedule(trampoline);
        }
    }
}

impl RafLoop {
    /// Wraps `on_frame` in an idle loop.
    pub fn new(on_frame: impl FnMut(f64) + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                trampoline: RefCell::new(None),
                on_frame: RefCell::new(Box::new(on_frame)),
                delivered: Cell::new(0),
                active: Cell::new(false),
                pending: Cell::new(0),
            }),
        }
    }

    /// Schedules the first frame. Does nothing if the loop is active.
    pub fn start(&self) {
        if self.shared.active.replace(true) {
            return;
        }
        let shared = Rc::clone(&self.shared);
        let trampoline: FrameClosure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            shared.deliver(timestamp_ms);
        }) as Box<dyn FnMut(f64)>);

        self.shared.schedule(&trampoline);
        *self.shared.trampoline.borrow_mut() = Some(trampoline);
    }

    /// Cancels the outstanding frame request. The loop may be started again.
    pub fn stop(&self) {
        if self.shared.active.replace(false) {
            cancel_animation_frame(self.shared.pending.get());
        }
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.active.get()
    }

    /// Returns how many frames have reached the callback.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.shared.delivered.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // The trampoline holds an `Rc` to `shared`; dropping it breaks the cycle.
        self.shared.trampoline.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.shared.active.get())
            .field("frames", &self.shared.delivered.get())
            .finish()
    }
}
