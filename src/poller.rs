//! Live-Data Poller
//!
//! Keeps the dashboard readouts in sync with the backend by fetching the latest
//! sensor reading on a fixed cadence.
//!
//! Every tick issues a fresh request without waiting for the previous one, so a
//! slow backend never stretches the cadence. Responses are rendered in the order
//! they complete: an earlier request finishing late can overwrite a newer
//! reading. Failures show a placeholder and are never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::display::{DisplayContext, FailurePolicy};
use crate::telemetry::{SensorReading, TelemetrySource};

/// Default polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Receives every successfully fetched reading
pub trait ReadingObserver: Send + Sync {
    fn observe(&self, reading: &SensorReading);
}

/// Polls the backend and renders readings into a display context
pub struct LiveDataPoller {
    source: Arc<dyn TelemetrySource>,
    display: DisplayContext,
    failure_policy: FailurePolicy,
    observers: Vec<Arc<dyn ReadingObserver>>,
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Counters since the poller was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
}

impl LiveDataPoller {
    /// Create a new poller
    pub fn new(source: Arc<dyn TelemetrySource>, display: DisplayContext) -> Self {
        Self {
            source,
            display,
            failure_policy: FailurePolicy::default(),
            observers: Vec::new(),
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Builder: set what happens to secondary readouts on failure
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Builder: register an observer for successful readings
    pub fn observer(mut self, observer: Arc<dyn ReadingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn stats(&self) -> PollStats {
        PollStats {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Fetch one reading and render it
    ///
    /// Returns the reading that was rendered, or `None` if the placeholder was
    /// shown instead. Errors never escape this call.
    pub async fn fetch_and_render(&self) -> Option<SensorReading> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        match self.source.fetch_reading().await {
            Ok(reading) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    temperature = reading.temperature,
                    gas_level = reading.gas_level,
                    helmet_violations = reading.helmet_violations,
                    "Live reading received"
                );

                self.display.render_reading(&reading);
                for observer in &self.observers {
                    observer.observe(&reading);
                }
                Some(reading)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "No live data");

                self.display.render_unavailable(self.failure_policy);
                None
            }
        }
    }

    /// Start polling: one fetch immediately, then one every `interval`
    ///
    /// Dropping the returned handle detaches the loop, which then runs for the
    /// rest of the process. Call [`PollerHandle::stop`] to end it; the poller
    /// can be started again afterwards.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> Result<PollerHandle, PollerError> {
        if interval.is_zero() {
            return Err(PollerError::ZeroInterval);
        }

        tracing::info!(interval_ms = interval.as_millis() as u64, "Starting live-data polling");

        let poller = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // First tick completes immediately
                ticker.tick().await;

                let poller = Arc::clone(&poller);
                tokio::spawn(async move {
                    poller.fetch_and_render().await;
                });
            }
        });

        Ok(PollerHandle { task })
    }
}

/// Handle to a running polling loop
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop scheduling new requests
    ///
    /// Requests already in flight still complete and render.
    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
        tracing::info!("Live-data polling stopped");
    }
}

/// Errors starting the poller
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PollerError {
    #[error("Polling interval must be greater than zero")]
    ZeroInterval,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{ElementIds, MemoryDocument, NO_LIVE_DATA};
    use crate::telemetry::{BackendError, DetectionReply};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Source that replays scripted replies, then falls back to a steady reading
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<SensorReading, BackendError>>>,
        fallback: Option<SensorReading>,
        pub calls: AtomicU64,
    }

    impl ScriptedSource {
        fn steady(reading: SensorReading) -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                fallback: Some(reading),
                calls: AtomicU64::new(0),
            }
        }

        fn scripted(replies: Vec<Result<SensorReading, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback: None,
                calls: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl TelemetrySource for ScriptedSource {
        async fn fetch_reading(&self) -> Result<SensorReading, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reply) = self.replies.lock().unwrap().pop_front() {
                return reply;
            }
            self.fallback.clone().ok_or(BackendError::Unavailable)
        }

        async fn run_detection(&self) -> Result<DetectionReply, BackendError> {
            Err(BackendError::Unavailable)
        }
    }

    /// Source whose n-th request takes `delays[n]` to answer with `readings[n]`;
    /// requests past the script hang for a minute
    struct SlowSource {
        script: Vec<(Duration, SensorReading)>,
        calls: AtomicU64,
    }

    impl SlowSource {
        fn new(script: Vec<(Duration, SensorReading)>) -> Self {
            Self {
                script,
                calls: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl TelemetrySource for SlowSource {
        async fn fetch_reading(&self) -> Result<SensorReading, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let (delay, reading) = self
                .script
                .get(n)
                .cloned()
                .unwrap_or((Duration::from_secs(60), SensorReading::new(0.0, 0.0, 0)));
            tokio::time::sleep(delay).await;
            Ok(reading)
        }

        async fn run_detection(&self) -> Result<DetectionReply, BackendError> {
            Err(BackendError::Unavailable)
        }
    }

    struct CountingObserver(AtomicU64);

    impl ReadingObserver for CountingObserver {
        fn observe(&self, _reading: &SensorReading) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn document() -> MemoryDocument {
        MemoryDocument::with_elements(&["temperature", "gas", "helmet"])
    }

    #[tokio::test]
    async fn test_fetch_and_render_success() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::steady(SensorReading::new(36.2, 412.0, 3)));
        let poller = LiveDataPoller::new(source, ctx);

        let rendered = poller.fetch_and_render().await;

        assert_eq!(rendered, Some(SensorReading::new(36.2, 412.0, 3)));
        assert_eq!(doc.text_of("temperature").as_deref(), Some("36.2 °C"));
        assert_eq!(doc.text_of("gas").as_deref(), Some("412 ppm"));
        assert_eq!(doc.text_of("helmet").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_network_failure_shows_placeholder() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::scripted(vec![
            Ok(SensorReading::new(31.0, 200.0, 0)),
            Err(BackendError::Unavailable),
        ]));
        let poller = LiveDataPoller::new(source, ctx);

        poller.fetch_and_render().await;
        assert_eq!(poller.fetch_and_render().await, None);

        assert_eq!(doc.text_of("temperature").as_deref(), Some(NO_LIVE_DATA));
        // Last-known-good secondary readouts stay visible by default
        assert_eq!(doc.text_of("gas").as_deref(), Some("200 ppm"));
        assert_eq!(doc.text_of("helmet").as_deref(), Some("0"));
        assert_eq!(
            poller.stats(),
            PollStats {
                requests: 2,
                successes: 1,
                failures: 1
            }
        );
    }

    #[tokio::test]
    async fn test_clear_policy_after_failure() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::scripted(vec![
            Ok(SensorReading::new(31.0, 200.0, 0)),
            Err(BackendError::Malformed("expected value".to_string())),
        ]));
        let poller = LiveDataPoller::new(source, ctx).failure_policy(FailurePolicy::Clear);

        poller.fetch_and_render().await;
        poller.fetch_and_render().await;

        assert_eq!(doc.text_of("temperature").as_deref(), Some(NO_LIVE_DATA));
        assert_eq!(doc.text_of("gas").as_deref(), Some(""));
        assert_eq!(doc.text_of("helmet").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_same_reading_renders_identically() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::steady(SensorReading::new(28.4, 390.5, 1)));
        let poller = LiveDataPoller::new(source, ctx);

        poller.fetch_and_render().await;
        let first = doc.text_of("temperature");
        poller.fetch_and_render().await;

        assert_eq!(doc.text_of("temperature"), first);
        assert_eq!(doc.get("temperature").unwrap().writes(), 2);
    }

    #[tokio::test]
    async fn test_observers_see_only_successes() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::scripted(vec![
            Ok(SensorReading::new(31.0, 200.0, 0)),
            Err(BackendError::Timeout),
            Ok(SensorReading::new(32.0, 210.0, 0)),
        ]));
        let observer = Arc::new(CountingObserver(AtomicU64::new(0)));
        let poller = LiveDataPoller::new(source, ctx).observer(observer.clone());

        for _ in 0..3 {
            poller.fetch_and_render().await;
        }

        assert_eq!(observer.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_cadence() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::steady(SensorReading::new(30.0, 300.0, 0)));
        let poller = Arc::new(LiveDataPoller::new(source.clone(), ctx));

        let handle = poller.start_polling(Duration::from_millis(5000)).unwrap();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(15_000)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        // floor(15000 / 5000) = 3
        assert!(source.calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(doc.text_of("gas").as_deref(), Some("300 ppm"));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_continues_through_failures() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::scripted(Vec::new()));
        let poller = Arc::new(LiveDataPoller::new(source.clone(), ctx));

        let handle = poller.start_polling(Duration::from_millis(1000)).unwrap();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert!(source.calls.load(Ordering::SeqCst) >= 10);
        assert_eq!(poller.stats().successes, 0);
        assert_eq!(doc.text_of("temperature").as_deref(), Some(NO_LIVE_DATA));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_requests_do_not_delay_cadence() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(SlowSource::new(Vec::new()));
        let poller = Arc::new(LiveDataPoller::new(source.clone(), ctx));

        let handle = poller.start_polling(Duration::from_millis(1000)).unwrap();
        tokio::time::sleep(Duration::from_millis(5500)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        // Ticks at 0..=5 s despite every request taking a minute
        assert!(source.calls.load(Ordering::SeqCst) >= 6);
        assert_eq!(poller.stats().successes, 0);
        assert_eq!(doc.text_of("temperature"), None);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_overwrites_newer_reading() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(SlowSource::new(vec![
            (Duration::from_millis(3000), SensorReading::new(20.0, 100.0, 0)),
            (Duration::ZERO, SensorReading::new(25.0, 150.0, 1)),
        ]));
        let poller = Arc::new(LiveDataPoller::new(source, ctx));

        let handle = poller.start_polling(Duration::from_millis(1000)).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(doc.text_of("temperature").as_deref(), Some("25 °C"));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        // The first request finished last and wins
        assert_eq!(doc.text_of("temperature").as_deref(), Some("20 °C"));
        assert_eq!(doc.text_of("helmet").as_deref(), Some("0"));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_restart() {
        let doc = document();
        let ctx = DisplayContext::bind(&doc, &ElementIds::default());
        let source = Arc::new(ScriptedSource::steady(SensorReading::new(30.0, 300.0, 0)));
        let poller = Arc::new(LiveDataPoller::new(source.clone(), ctx));

        let handle = poller.start_polling(Duration::from_millis(5000)).unwrap();
        tokio::time::sleep(Duration::from_millis(6000)).await;
        handle.stop().await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        let after_stop = source.calls.load(Ordering::SeqCst);
        assert!(after_stop >= 2);

        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), after_stop);

        let handle = poller.start_polling(Duration::from_millis(5000)).unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(source.calls.load(Ordering::SeqCst) > after_stop);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let ctx = DisplayContext::default();
        let source = Arc::new(ScriptedSource::scripted(Vec::new()));
        let poller = Arc::new(LiveDataPoller::new(source, ctx));

        let result = poller.start_polling(Duration::ZERO);
        assert_eq!(result.err(), Some(PollerError::ZeroInterval));
    }
}
