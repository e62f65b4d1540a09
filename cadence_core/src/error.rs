// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Only [`ConfigError`] ever reaches the host as a failure: an engine with an
//! invalid configuration refuses to start. Every runtime fault
//! ([`CallbackError`], [`SinkError`]) is absorbed by the engine and surfaced
//! through logs, reports, and diagnostics instead.

use alloc::string::String;

use crate::quality::QualityTier;
use crate::registry::CallbackHandle;

/// Invalid construction parameters.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The frame budget must be a positive, finite number of milliseconds.
    #[error("target frame time must be positive and finite, got {0} ms")]
    TargetFrame(f64),
    /// The delta clamp must be a positive, finite number of milliseconds.
    #[error("maximum tick delta must be positive and finite, got {0} ms")]
    MaxDelta(f64),
    /// A quality tier was given a zero flush cap.
    #[error("max batch size for quality tier {0} must be at least 1")]
    ZeroBatchSize(QualityTier),
    /// `Some(0)` would drop every deferred low-priority update immediately.
    #[error("anti-starvation window must be at least 1 tick when set")]
    ZeroStarvationWindow,
    /// A tick window or threshold was zero.
    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),
    /// Recovery must be slower than degradation.
    #[error(
        "step-up hysteresis ({up} ticks) must be longer than step-down hysteresis ({down} ticks)"
    )]
    Hysteresis {
        /// Configured step-down window.
        down: u32,
        /// Configured step-up window.
        up: u32,
    },
    /// The recovery ratio must sit strictly below the overload ratio.
    #[error("recovery ratio {recovery} must be positive and below overload ratio {overload}")]
    Ratios {
        /// Configured overload threshold.
        overload: f64,
        /// Configured recovery threshold.
        recovery: f64,
    },
    /// The capability re-evaluation period must be positive and finite.
    #[error("re-evaluation interval must be positive and finite, got {0} ms")]
    ReevaluateInterval(f64),
}

/// A fault reported by a frame callback.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// A render-surface sink failed to apply a property.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to apply property: {message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A callback handle no longer refers to a registered callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("callback handle {0:?} is stale")]
pub struct StaleHandle(pub CallbackHandle);
