// ── Telemetry store ──
//
// Latest device-reported value per (device, attribute) plus a bounded
// reading history per flex sensor. Writes come only from the session's
// inbound task; reads are lock-free snapshots. Every mutation bumps a
// version counter on a `watch` channel.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use exolink_api::{Attribute, Device, SensorIndex, Value};
use serde::Serialize;
use tokio::sync::watch;

use crate::event::ProtocolEvent;

/// One time-stamped value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: Value,
}

/// Latest value for one (device, attribute) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub device: Device,
    pub attribute: Attribute,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

pub struct TelemetryStore {
    latest: DashMap<(Device, Attribute), Sample>,
    history: DashMap<SensorIndex, VecDeque<Sample>>,
    history_len: usize,
    version: watch::Sender<u64>,
}

impl TelemetryStore {
    pub fn new(history_len: usize) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            latest: DashMap::new(),
            history: DashMap::new(),
            history_len,
            version,
        }
    }

    /// Fold one event into the store.
    pub fn apply(&self, event: &ProtocolEvent) {
        self.apply_at(event, Utc::now());
    }

    pub(crate) fn apply_at(&self, event: &ProtocolEvent, at: DateTime<Utc>) {
        let sample = Sample {
            at,
            value: event.value().clone(),
        };

        if let ProtocolEvent::SensorReadingUpdated { sensor, .. } = event {
            if self.history_len > 0 {
                let mut history = self.history.entry(*sensor).or_default();
                if history.len() == self.history_len {
                    history.pop_front();
                }
                history.push_back(sample.clone());
            }
        }

        self.latest.insert((event.device(), event.attribute()), sample);
        self.version.send_modify(|v| *v += 1);
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn latest(&self, device: Device, attribute: Attribute) -> Option<Sample> {
        self.latest
            .get(&(device, attribute))
            .map(|entry| entry.value().clone())
    }

    /// Buffered readings for one sensor, oldest first.
    pub fn history(&self, sensor: SensorIndex) -> Vec<Sample> {
        self.history
            .get(&sensor)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every known value in wire order of device, then attribute.
    pub fn snapshot(&self) -> Vec<Reading> {
        let mut readings: Vec<Reading> = self
            .latest
            .iter()
            .map(|entry| {
                let (device, attribute) = *entry.key();
                Reading {
                    device,
                    attribute,
                    value: entry.value().value.clone(),
                    updated_at: entry.value().at,
                }
            })
            .collect();
        readings.sort_by_key(|r| (r.device, r.attribute));
        readings
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.latest.iter().map(|entry| entry.value().at).max()
    }

    // ── Change notification ──────────────────────────────────────────

    /// Receiver that changes whenever the store does. The value is a
    /// monotonically increasing mutation count.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LEN)
    }
}
