// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated session that exercises the frame loop and diagnostics pipeline.
//!
//! Runs ten seconds of synthetic 60 Hz ticks through an [`Engine`] with a
//! handful of producers. Midway through, the spectrum producer gets
//! expensive (quality degrades, then recovers) and the beat producer starts
//! failing (its circuit breaker trips, then it is re-enabled). Events go to
//! a [`PrettyPrintSink`] and a [`RecorderSink`]; the recording is exported as
//! a Chrome trace and the final diagnostics are printed as JSON.

use std::cell::Cell;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::rc::Rc;

use cadence_core::capability::{CapabilityReport, DeviceClass, DeviceSignals};
use cadence_core::config::EngineConfig;
use cadence_core::controller::QualityChange;
use cadence_core::coordinator::TickReport;
use cadence_core::engine::Engine;
use cadence_core::error::CallbackError;
use cadence_core::priority::PriorityTier;
use cadence_core::sink::MemorySink;
use cadence_core::time::ManualClock;
use cadence_core::trace::{
    BreakerTripEvent, BudgetSkipEvent, CallbackEvent, FlushEvent, TickBeginEvent, TraceSink,
};

use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;

const TICK_COUNT: u32 = 600;
/// ≈60 Hz refresh interval in milliseconds.
const REFRESH_INTERVAL_MS: f64 = 1000.0 / 60.0;
/// Ticks during which the spectrum producer is expensive.
const SPIKE: Range<u32> = 60..200;
/// Ticks during which the beat producer fails.
const BEAT_OUTAGE: Range<u32> = 100..110;
const BEAT_RESTORE_TICK: u32 = 150;

/// Forwards every event to two sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.pretty.on_tick_begin(e);
        self.recorder.on_tick_begin(e);
    }

    fn on_callback(&mut self, e: &CallbackEvent<'_>) {
        self.pretty.on_callback(e);
        self.recorder.on_callback(e);
    }

    fn on_breaker_trip(&mut self, e: &BreakerTripEvent<'_>) {
        self.pretty.on_breaker_trip(e);
        self.recorder.on_breaker_trip(e);
    }

    fn on_budget_skip(&mut self, e: &BudgetSkipEvent) {
        self.pretty.on_budget_skip(e);
        self.recorder.on_budget_skip(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.pretty.on_flush(e);
        self.recorder.on_flush(e);
    }

    fn on_tick_complete(&mut self, r: &TickReport) {
        self.pretty.on_tick_complete(r);
        self.recorder.on_tick_complete(r);
    }

    fn on_quality_change(&mut self, c: &QualityChange) {
        self.pretty.on_quality_change(c);
        self.recorder.on_quality_change(c);
    }

    fn on_capability_report(&mut self, r: &CapabilityReport) {
        self.pretty.on_capability_report(r);
        self.recorder.on_capability_report(r);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout())).without_callbacks();
    let mut recorder = RecorderSink::new();

    // -- engine ------------------------------------------------------------
    let clock = ManualClock::new(0.0);
    let signals = DeviceSignals {
        logical_cores: Some(8),
        memory_gb: Some(8.0),
        gpu_accelerated: Some(true),
        class: DeviceClass::Desktop,
        reduced_motion: false,
    };
    let config = EngineConfig {
        reevaluate_interval_ms: 2000.0,
        ..EngineConfig::new()
    };
    let mut engine = Engine::new(config, signals, MemorySink::new(), clock.clone())?;

    // Shared tick index so producers can follow the script.
    let now = Rc::new(Cell::new(0_u32));

    let c = clock.clone();
    engine.register("press-feedback", PriorityTier::Critical, move |ctx| {
        c.advance(0.2);
        ctx.enqueue("press-scale", "1.0", PriorityTier::Critical);
        Ok(())
    });

    let (c, n) = (clock.clone(), Rc::clone(&now));
    engine.register("spectrum", PriorityTier::High, move |ctx| {
        let base = if SPIKE.contains(&n.get()) { 22.0 } else { 5.0 };
        c.advance(base * f64::from(ctx.quality.multiplier));
        ctx.enqueue("spectrum-peak", format!("{:.2}", ctx.quality.multiplier), PriorityTier::High);
        Ok(())
    });

    let (c, n) = (clock.clone(), Rc::clone(&now));
    let beat = engine.register("beat-pulse", PriorityTier::High, move |ctx| {
        c.advance(0.5);
        if BEAT_OUTAGE.contains(&n.get()) {
            return Err(CallbackError::new("beat detector produced no onsets"));
        }
        ctx.enqueue("beat-pulse", "1", PriorityTier::High);
        Ok(())
    });

    let c = clock.clone();
    engine.register("palette", PriorityTier::Normal, move |ctx| {
        c.advance(2.0);
        let hue = ctx.tick % 360;
        ctx.enqueue("accent-hsl", format!("{hue},80%,60%"), PriorityTier::Normal);
        Ok(())
    });

    let c = clock.clone();
    engine.register("sparkle", PriorityTier::Low, move |ctx| {
        c.advance(1.5 * f64::from(ctx.quality.multiplier));
        ctx.enqueue("sparkle-density", format!("{}", ctx.quality.multiplier), PriorityTier::Low);
        Ok(())
    });

    // -- simulated loop ----------------------------------------------------
    let mut tee = Tee {
        pretty: &mut pretty,
        recorder: &mut recorder,
    };
    for tick in 0..TICK_COUNT {
        now.set(tick);
        if tick == BEAT_RESTORE_TICK {
            engine.enable(beat)?;
        }
        let timestamp_ms = f64::from(tick) * REFRESH_INTERVAL_MS;
        clock.set(timestamp_ms);
        engine.tick_traced(timestamp_ms, &mut tee);
    }

    // -- report ------------------------------------------------------------
    let history = engine.coordinator().history();
    println!("load  {}", history.sparkline_ascii(0.0, 2.0 * REFRESH_INTERVAL_MS));
    println!(
        "final tier {} after {} ticks; {} updates applied",
        engine.quality_state().tier,
        engine.coordinator().current_tick(),
        engine.sink().applied().len(),
    );
    cadence_debug::snapshot::write(&engine.diagnostics(), &mut std::io::stdout())?;
    println!();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    cadence_debug::chrome::export(recorder.events(), &mut writer)?;

    println!("Wrote {path} ({TICK_COUNT} ticks, {} events)", recorder.len());
    Ok(())
}
