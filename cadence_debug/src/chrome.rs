// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Callback and flush durations are laid out back to back from the start of
//! their tick, since the engine reports how long each step took rather than
//! when it started.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are in microseconds.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::new();
    // Start of the current tick and the running offset into it, in ms.
    let mut tick_start_ms = 0.0;
    let mut cursor_ms = 0.0;

    for recorded in events {
        match recorded {
            RecordedEvent::TickBegin {
                tick,
                timestamp_ms,
                delta_ms,
                target_ms,
            } => {
                tick_start_ms = *timestamp_ms;
                cursor_ms = *timestamp_ms;
                out.push(json!({
                    "ph": "i",
                    "name": "TickBegin",
                    "cat": "Coordinator",
                    "ts": ms_to_us(*timestamp_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick": tick,
                        "delta_ms": delta_ms,
                        "target_ms": target_ms,
                    }
                }));
            }
            RecordedEvent::Callback(c) => {
                out.push(json!({
                    "ph": "X",
                    "name": c.id,
                    "cat": "Callback",
                    "ts": ms_to_us(cursor_ms),
                    "dur": ms_to_us(c.elapsed_ms),
                    "pid": 0,
                    "tid": c.priority.index(),
                    "args": {
                        "tick": c.tick,
                        "priority": c.priority.as_str(),
                        "ok": c.ok,
                    }
                }));
                cursor_ms += c.elapsed_ms.max(0.0);
            }
            RecordedEvent::BreakerTrip {
                tick,
                id,
                consecutive_failures,
            } => {
                out.push(json!({
                    "ph": "i",
                    "name": "BreakerTrip",
                    "cat": "Coordinator",
                    "ts": ms_to_us(cursor_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "tick": tick,
                        "id": id,
                        "consecutive_failures": consecutive_failures,
                    }
                }));
            }
            RecordedEvent::BudgetSkip {
                tick,
                from,
                skipped,
            } => {
                out.push(json!({
                    "ph": "i",
                    "name": "BudgetSkip",
                    "cat": "Coordinator",
                    "ts": ms_to_us(cursor_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "tick": tick,
                        "from": from.as_str(),
                        "skipped": skipped,
                    }
                }));
            }
            RecordedEvent::Flush {
                tick,
                applied,
                deferred,
                failed,
                dropped,
                elapsed_ms,
            } => {
                out.push(json!({
                    "ph": "X",
                    "name": "Flush",
                    "cat": "Queue",
                    "ts": ms_to_us(cursor_ms),
                    "dur": ms_to_us(*elapsed_ms),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick": tick,
                        "applied": applied,
                        "deferred": deferred,
                        "failed": failed,
                        "dropped": dropped,
                    }
                }));
                cursor_ms += elapsed_ms.max(0.0);
            }
            RecordedEvent::TickComplete {
                tick,
                consumed_ms,
                target_ms,
                overrun,
                overrun_count,
            } => {
                out.push(json!({
                    "ph": "C",
                    "name": "Load",
                    "cat": "Summary",
                    "ts": ms_to_us(tick_start_ms),
                    "pid": 0,
                    "args": {
                        "consumed_ms": consumed_ms,
                        "target_ms": target_ms,
                    }
                }));
                out.push(json!({
                    "ph": "i",
                    "name": "TickComplete",
                    "cat": "Summary",
                    "ts": ms_to_us(cursor_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick": tick,
                        "overrun": overrun,
                        "overrun_count": overrun_count,
                    }
                }));
            }
            RecordedEvent::QualityChange(c) => {
                out.push(json!({
                    "ph": "i",
                    "name": "QualityChange",
                    "cat": "Controller",
                    "ts": ms_to_us(cursor_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick": c.tick,
                        "from": c.from.as_str(),
                        "to": c.to.as_str(),
                        "multiplier": c.multiplier,
                        "reason": c.reason.to_string(),
                    }
                }));
            }
            RecordedEvent::Capability(r) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Capability",
                    "cat": "Analyzer",
                    "ts": ms_to_us(r.at_ms),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tier": r.tier.as_str(),
                        "notes": r.notes(),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn ms_to_us(ms: f64) -> f64 {
    ms * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use cadence_core::capability::DeviceSignals;
    use cadence_core::config::EngineConfig;
    use cadence_core::engine::Engine;
    use cadence_core::priority::PriorityTier;
    use cadence_core::sink::MemorySink;
    use cadence_core::time::ManualClock;

    #[test]
    fn export_produces_valid_json() {
        let clock = ManualClock::new(0.0);
        let mut engine = Engine::new(
            EngineConfig::new(),
            DeviceSignals::default(),
            MemorySink::new(),
            clock.clone(),
        )
        .unwrap();
        engine.register("spectrum", PriorityTier::High, move |ctx| {
            clock.advance(2.0);
            ctx.enqueue("bar-0", "0.5", PriorityTier::Normal);
            Ok(())
        });
        let mut rec = RecorderSink::new();
        engine.tick_traced(100.0, &mut rec);

        let mut out = Vec::new();
        export(rec.events(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 5);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "TickBegin");

        // The callback is a complete event starting at the tick timestamp.
        assert_eq!(parsed[1]["ph"], "X");
        assert_eq!(parsed[1]["name"], "spectrum");
        assert_eq!(parsed[1]["ts"], 100_000.0);
        assert_eq!(parsed[1]["dur"], 2000.0);

        // The flush follows it.
        assert_eq!(parsed[2]["name"], "Flush");
        assert_eq!(parsed[2]["ts"], 102_000.0);
        assert_eq!(parsed[2]["args"]["applied"], 1);

        assert_eq!(parsed[3]["ph"], "C");
        assert_eq!(parsed[4]["name"], "TickComplete");
    }

    #[test]
    fn callbacks_use_priority_lanes() {
        let mut engine = Engine::new(
            EngineConfig::new(),
            DeviceSignals::default(),
            MemorySink::new(),
            ManualClock::new(0.0),
        )
        .unwrap();
        engine.register("ambient", PriorityTier::Low, |_| Ok(()));
        engine.register("press", PriorityTier::Critical, |_| Ok(()));
        let mut rec = RecorderSink::new();
        engine.tick_traced(0.0, &mut rec);

        let mut out = Vec::new();
        export(rec.events(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        let lanes: Vec<(&str, u64)> = parsed
            .iter()
            .filter(|e| e["cat"] == "Callback")
            .map(|e| (e["name"].as_str().unwrap(), e["tid"].as_u64().unwrap()))
            .collect();
        assert_eq!(lanes, [("press", 0), ("ambient", 3)]);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
