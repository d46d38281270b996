//! Safety Analytics
//!
//! Derived views over sensor readings:
//!
//! - **safety**: 0-100 site safety score and risk bands
//! - **trend**: bounded reading history with a moving-average forecast
//! - **alerts**: most-severe-condition classification and a change-logging monitor

mod alerts;
mod safety;
mod trend;

pub use alerts::{Alert, AlertChange, AlertMonitor, CRITICAL_SCORE};
pub use safety::{safety_score, RiskLevel, GAS_LIMIT, TEMPERATURE_LIMIT};
pub use trend::{
    moving_average_forecast, HistoryEntry, ReadingHistory, SharedHistory, FORECAST_STEPS,
    FORECAST_WINDOW, MAX_HISTORY,
};
