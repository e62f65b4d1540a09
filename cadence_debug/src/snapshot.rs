// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON rendering of [`Diagnostics`] snapshots.

use std::io::{self, Write};

use cadence_core::diagnostics::Diagnostics;
use cadence_core::priority::PriorityTier;
use cadence_core::registry::DisableReason;
use serde_json::{Map, Value, json};

/// Renders a snapshot as a JSON object.
///
/// Queue depth is keyed by priority name rather than index.
#[must_use]
pub fn to_json(diag: &Diagnostics) -> Value {
    let mut depth = Map::new();
    for priority in PriorityTier::ALL {
        depth.insert(
            priority.as_str().to_owned(),
            json!(diag.queue_depth[priority.index()]),
        );
    }

    let disabled: Vec<Value> = diag
        .disabled
        .iter()
        .map(|d| {
            let reason = match d.reason {
                DisableReason::Producer => "producer",
                DisableReason::CircuitBreaker => "circuit-breaker",
            };
            json!({
                "id": d.id,
                "priority": d.priority.as_str(),
                "reason": reason,
                "consecutive_failures": d.consecutive_failures,
                "handle": format!("{:?}", d.handle),
            })
        })
        .collect();

    json!({
        "tick": diag.tick,
        "tier": diag.tier.as_str(),
        "multiplier": diag.multiplier,
        "overrun_count": diag.overrun_count,
        "queue_depth": depth,
        "disabled": disabled,
        "registered": diag.registered,
        "starvation_drops": diag.starvation_drops,
        "sink_failures": diag.sink_failures,
        "callback_faults": diag.callback_faults,
    })
}

/// Writes a snapshot as pretty-printed JSON.
pub fn write(diag: &Diagnostics, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &to_json(diag))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::capability::DeviceSignals;
    use cadence_core::config::EngineConfig;
    use cadence_core::engine::Engine;
    use cadence_core::error::CallbackError;
    use cadence_core::sink::MemorySink;
    use cadence_core::time::ManualClock;

    #[test]
    fn snapshot_lists_disabled_callbacks() {
        let mut engine = Engine::new(
            EngineConfig::new(),
            DeviceSignals::default(),
            MemorySink::new(),
            ManualClock::new(0.0),
        )
        .unwrap();
        engine.register("beat-pulse", PriorityTier::High, |_| {
            Err(CallbackError::new("no beat"))
        });
        let idle = engine.register("idle-shimmer", PriorityTier::Low, |_| Ok(()));
        engine.disable(idle).unwrap();
        for i in 0..3_u32 {
            engine.tick(f64::from(i) * 16.0);
        }
        engine.enqueue("accent-rgb", "1,2,3", PriorityTier::High);

        let value = to_json(&engine.diagnostics());
        assert_eq!(value["tick"], 3);
        assert_eq!(value["tier"], "high");
        assert_eq!(value["queue_depth"]["high"], 1);
        assert_eq!(value["queue_depth"]["low"], 0);
        assert_eq!(value["registered"], 2);
        assert_eq!(value["callback_faults"], 3);

        let disabled = value["disabled"].as_array().unwrap();
        assert_eq!(disabled.len(), 2);
        let reasons: Vec<(&str, &str)> = disabled
            .iter()
            .map(|d| (d["id"].as_str().unwrap(), d["reason"].as_str().unwrap()))
            .collect();
        assert!(reasons.contains(&("beat-pulse", "circuit-breaker")));
        assert!(reasons.contains(&("idle-shimmer", "producer")));
    }

    #[test]
    fn write_emits_parseable_json() {
        let engine = Engine::new(
            EngineConfig::new(),
            DeviceSignals::default(),
            MemorySink::new(),
            ManualClock::new(0.0),
        )
        .unwrap();
        let mut out = Vec::new();
        write(&engine.diagnostics(), &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["disabled"], json!([]));
        assert_eq!(parsed["multiplier"], 1.0);
    }
}
