// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static device assessment and periodic re-evaluation.
//!
//! Before any frame-timing history exists, the engine needs a starting tier.
//! [`assess`] scores coarse [`DeviceSignals`] into one. The
//! [`CapabilityAnalyzer`] then re-evaluates at a low frequency against the
//! coordinator's recent [`BudgetSummary`]. Its output is a prior: the
//! [`AdaptiveController`](crate::controller::AdaptiveController) decides what
//! the live tier actually is.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::budget::BudgetSummary;
use crate::quality::QualityTier;

/// Fraction of recent ticks that must overrun before a re-evaluation lowers
/// the prior.
pub const SUSTAINED_OVERRUN_FRACTION: f64 = 0.5;

/// Coarse form-factor classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Laptop or desktop.
    Desktop,
    /// Tablet.
    Tablet,
    /// Phone.
    Mobile,
    /// Not reported.
    #[default]
    Unknown,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
            Self::Unknown => "unknown",
        })
    }
}

/// Static signals reported by the host. Missing signals cost nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceSignals {
    /// Logical processor count.
    pub logical_cores: Option<u32>,
    /// Approximate device memory in GiB.
    pub memory_gb: Option<f32>,
    /// Whether graphics acceleration is available.
    pub gpu_accelerated: Option<bool>,
    /// Form factor.
    pub class: DeviceClass,
    /// The user asked for reduced motion.
    pub reduced_motion: bool,
}

/// Outcome of one assessment.
#[derive(Clone, Debug, PartialEq)]
pub struct CapabilityReport {
    /// Recommended tier.
    pub tier: QualityTier,
    /// Clock time of the assessment, in ms.
    pub at_ms: f64,
    notes: Vec<String>,
}

impl CapabilityReport {
    /// Explanations for every deduction, in the order applied.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

/// Scores `signals` into a tier.
///
/// The score starts at 3 (`High`) and loses points for few cores, little
/// memory, missing acceleration and a mobile form factor. A reduced-motion
/// preference caps the result at `Low`.
#[must_use]
pub fn assess(signals: &DeviceSignals, at_ms: f64) -> CapabilityReport {
    let mut report = CapabilityReport {
        tier: QualityTier::High,
        at_ms,
        notes: Vec::new(),
    };
    let mut score: i32 = 3;

    match signals.logical_cores {
        Some(cores) if cores <= 2 => {
            score -= 2;
            report.push_note(format!("{cores} logical cores"));
        }
        Some(cores) if cores <= 4 => {
            score -= 1;
            report.push_note(format!("{cores} logical cores"));
        }
        Some(_) => {}
        None => report.push_note("core count not reported"),
    }

    match signals.memory_gb {
        Some(gb) if gb < 2.0 => {
            score -= 2;
            report.push_note(format!("{gb} GiB memory"));
        }
        Some(gb) if gb < 4.0 => {
            score -= 1;
            report.push_note(format!("{gb} GiB memory"));
        }
        Some(_) => {}
        None => report.push_note("memory class not reported"),
    }

    if signals.gpu_accelerated == Some(false) {
        score -= 1;
        report.push_note("graphics acceleration unavailable");
    }

    if signals.class == DeviceClass::Mobile {
        score -= 1;
        report.push_note("mobile device");
    }

    report.tier = match score {
        3.. => QualityTier::High,
        2 => QualityTier::Medium,
        1 => QualityTier::Low,
        _ => QualityTier::Minimal,
    };

    if signals.reduced_motion && report.tier > QualityTier::Low {
        report.tier = QualityTier::Low;
        report.push_note("reduced motion requested");
    }

    if report.notes.is_empty() {
        report.push_note("no constraints detected");
    }
    report
}

/// Produces the initial prior and re-evaluates it periodically.
#[derive(Clone, Debug)]
pub struct CapabilityAnalyzer {
    signals: DeviceSignals,
    interval_ms: f64,
    last: CapabilityReport,
}

impl CapabilityAnalyzer {
    /// Assesses `signals` at `now_ms` and schedules re-evaluation every
    /// `interval_ms`.
    #[must_use]
    pub fn new(signals: DeviceSignals, interval_ms: f64, now_ms: f64) -> Self {
        let last = assess(&signals, now_ms);
        tracing::info!(
            tier = %last.tier,
            notes = ?last.notes(),
            "initial capability assessment"
        );
        Self {
            signals,
            interval_ms,
            last,
        }
    }

    /// Returns the most recent prior.
    #[must_use]
    pub fn prior(&self) -> QualityTier {
        self.last.tier
    }

    /// Returns the most recent report.
    #[must_use]
    pub fn last_report(&self) -> &CapabilityReport {
        &self.last
    }

    /// Returns the signals the analyzer scores.
    #[must_use]
    pub fn signals(&self) -> &DeviceSignals {
        &self.signals
    }

    /// Re-evaluates if the interval has elapsed since the last report.
    ///
    /// Sustained overrun in `recent` lowers the static tier by one level.
    pub fn poll(&mut self, now_ms: f64, recent: &BudgetSummary) -> Option<CapabilityReport> {
        if now_ms - self.last.at_ms < self.interval_ms {
            return None;
        }
        let mut report = assess(&self.signals, now_ms);
        if recent.samples > 0 && recent.overrun_fraction() >= SUSTAINED_OVERRUN_FRACTION {
            if let Some(lower) = report.tier.step_down() {
                report.tier = lower;
            }
            let percent = recent.overrun_fraction() * 100.0;
            report.push_note(format!(
                "{percent:.0}% of the last {} ticks overran",
                recent.samples
            ));
        }
        tracing::info!(
            tier = %report.tier,
            notes = ?report.notes(),
            "capability re-evaluated"
        );
        self.last = report.clone();
        Some(report)
    }
}
