// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CSS custom-property sink.

use alloc::format;
use alloc::string::String;

use cadence_core::error::SinkError;
use cadence_core::sink::PropertySink;
use web_sys::{CssStyleDeclaration, HtmlElement};

/// Applies flushed updates as CSS custom properties on one element.
///
/// Keys are prefixed (by default with `--`), so the key `accent-rgb` sets
/// `--accent-rgb`, which stylesheets read with `var(--accent-rgb)`.
pub struct StyleSink {
    style: CssStyleDeclaration,
    prefix: String,
    name: String,
}

impl core::fmt::Debug for StyleSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StyleSink")
            .field("style", &"CssStyleDeclaration")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl StyleSink {
    /// Creates a sink writing `--<key>` properties on `element`.
    #[must_use]
    pub fn new(element: &HtmlElement) -> Self {
        Self::with_prefix(element, "--")
    }

    /// Creates a sink writing `<prefix><key>` properties on `element`.
    #[must_use]
    pub fn with_prefix(element: &HtmlElement, prefix: &str) -> Self {
        Self {
            style: element.style(),
            prefix: prefix.into(),
            name: String::new(),
        }
    }

    /// Returns the style declaration being written.
    #[must_use]
    pub fn style(&self) -> &CssStyleDeclaration {
        &self.style
    }
}

impl PropertySink for StyleSink {
    fn apply_property(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        self.name.clear();
        self.name.push_str(&self.prefix);
        self.name.push_str(key);
        self.style
            .set_property(&self.name, value)
            .map_err(|err| SinkError::new(format!("setProperty({}) failed: {err:?}", self.name)))
    }
}
