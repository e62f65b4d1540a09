// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-surface sink contract.
//!
//! The engine never touches the render surface itself. Each flush hands the
//! winning value for every key to a [`PropertySink`] supplied by the host,
//! e.g. a styling system that sets CSS custom properties.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::SinkError;

/// Applies named property values to a render surface.
///
/// Implementations are assumed to be idempotent, cheap (sub-millisecond) and
/// non-blocking. Time spent here is charged to the frame budget of the tick
/// that flushed the update.
///
/// An error skips that one key for the current flush; the engine does not
/// re-enqueue it.
pub trait PropertySink {
    /// Applies `value` to the property named `key`.
    fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError>;
}

impl<S: PropertySink + ?Sized> PropertySink for &mut S {
    fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        (**self).apply_property(key, value)
    }
}

impl<S: PropertySink + ?Sized> PropertySink for alloc::boxed::Box<S> {
    fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        (**self).apply_property(key, value)
    }
}

/// An in-memory sink that records every application in order.
///
/// Useful for headless hosts and for asserting exactly what a flush did.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    applied: Vec<(String, String)>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(key, value)` applied so far, oldest first.
    #[must_use]
    pub fn applied(&self) -> &[(String, String)] {
        &self.applied
    }

    /// Returns the most recently applied value for `key`.
    #[must_use]
    pub fn latest(&self, key: &str) -> Option<&str> {
        self.applied
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns how many times `key` was applied.
    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.applied.iter().filter(|(k, _)| k == key).count()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.applied.clear();
    }
}

impl PropertySink for MemorySink {
    fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        self.applied.push((key.into(), value.into()));
        Ok(())
    }
}
