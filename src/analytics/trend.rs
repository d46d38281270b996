//! Reading History & Forecast
//!
//! Bounded history of recent readings and a moving-average forecast over it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use super::safety::raw_safety_score;
use crate::poller::ReadingObserver;
use crate::telemetry::SensorReading;

/// Readings kept in history
pub const MAX_HISTORY: usize = 60;

/// Steps produced by a forecast
pub const FORECAST_STEPS: usize = 12;

/// Moving-average window
pub const FORECAST_WINDOW: usize = 5;

/// One recorded reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub reading: SensorReading,
}

/// Ring of the most recent readings, oldest first
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl ReadingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a reading, evicting the oldest entry when full
    pub fn push(&mut self, reading: SensorReading, recorded_at: DateTime<Utc>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            recorded_at,
            reading,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.reading.temperature).collect()
    }

    pub fn gas_levels(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.reading.gas_level).collect()
    }

    pub fn helmet_violations(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|e| f64::from(e.reading.helmet_violations))
            .collect()
    }

    /// Reading expected at the next step, from the first forecast value of
    /// each series. The helmet count is rounded to whole violations; use
    /// [`ReadingHistory::predicted_score`] for the unrounded score. `None` when
    /// there is no history.
    pub fn predicted_reading(&self) -> Option<SensorReading> {
        let (temperature, gas_level, violations) = self.next_step()?;
        Some(SensorReading::new(
            temperature,
            gas_level,
            violations.round().max(0.0) as u32,
        ))
    }

    /// Safety score expected at the next step, scored from the raw forecast
    /// values with normal vibration
    pub fn predicted_score(&self) -> Option<f64> {
        let (temperature, gas_level, violations) = self.next_step()?;
        Some(raw_safety_score(temperature, gas_level, violations, false))
    }

    fn next_step(&self) -> Option<(f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }

        let next = |series: Vec<f64>| {
            moving_average_forecast(&series, 1, FORECAST_WINDOW)
                .first()
                .copied()
                .unwrap_or_default()
        };

        Some((
            next(self.temperatures()),
            next(self.gas_levels()),
            next(self.helmet_violations()),
        ))
    }
}

/// Forecast `periods` values by repeatedly appending the mean of the last
/// `window` values. Each step is rounded to two decimals.
pub fn moving_average_forecast(values: &[f64], periods: usize, window: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; periods];
    }

    let window = window.max(1);
    let mut series = values.to_vec();
    let mut forecast = Vec::with_capacity(periods);

    for _ in 0..periods {
        let w = window.min(series.len());
        let tail = &series[series.len() - w..];
        let mean = tail.iter().sum::<f64>() / w as f64;

        forecast.push((mean * 100.0).round() / 100.0);
        series.push(mean);
    }

    forecast
}

/// History shared between the poller and its readers
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    inner: Arc<RwLock<ReadingHistory>>,
}

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ReadingHistory::new(capacity))),
        }
    }

    /// Copy of the current history
    pub fn snapshot(&self) -> ReadingHistory {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ReadingObserver for SharedHistory {
    fn observe(&self, reading: &SensorReading) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(reading.clone(), Utc::now());
    }
}
