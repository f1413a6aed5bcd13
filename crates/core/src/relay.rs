//! Streaming relay: turns one analysis into a sequence of named events.
//!
//! A single task multiplexes the analysis future, a cosmetic progress
//! ticker, a heartbeat and state-change notifications with `tokio::select!`.
//! Events leave through a bounded channel; the first failed send means the
//! client is gone, and the analysis future is dropped on the spot.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::fetch::PageSource;
use crate::model::ModelBackend;
use crate::report::{Mode, Report};

/// Where an analysis is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    Idle,
    Fetching,
    Extracting,
    ModelCalling,
    Parsing,
    Done,
    Failed,
}

impl RelayState {
    fn rank(self) -> u8 {
        match self {
            RelayState::Idle => 0,
            RelayState::Fetching => 1,
            RelayState::Extracting => 2,
            RelayState::ModelCalling => 3,
            RelayState::Parsing => 4,
            RelayState::Done => 5,
            RelayState::Failed => 6,
        }
    }

    /// Progress shown once this state is reached.
    pub fn progress_floor(self) -> u8 {
        match self {
            RelayState::Idle | RelayState::Failed => 0,
            RelayState::Fetching => 5,
            RelayState::Extracting => 25,
            RelayState::ModelCalling => 35,
            RelayState::Parsing => 90,
            RelayState::Done => 100,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RelayState::Done | RelayState::Failed)
    }

    /// Steps only go forward one at a time; `Failed` is reachable from any
    /// non-terminal state and nothing leaves a terminal state.
    pub fn can_advance_to(self, next: RelayState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == RelayState::Failed || next.rank() == self.rank() + 1
    }
}

/// One event on an analysis stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Progress { value: u8 },
    /// Keepalive; `t` is milliseconds since the Unix epoch.
    Ping { t: i64 },
    Result(Box<Report>),
    Error { message: String },
}

impl StreamEvent {
    pub fn ping_now() -> Self {
        let t = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        StreamEvent::Ping { t: t as i64 }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Ping { .. } => "ping",
            StreamEvent::Result(_) => "result",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// JSON payload for the SSE `data:` line.
    pub fn data_json(&self) -> String {
        match self {
            StreamEvent::Progress { value } => json!({ "value": value }).to_string(),
            StreamEvent::Ping { t } => json!({ "t": t }).to_string(),
            StreamEvent::Result(report) => serde_json::to_string(report)
                .unwrap_or_else(|e| json!({ "message": format!("failed to encode report: {e}") }).to_string()),
            StreamEvent::Error { message } => json!({ "message": message }).to_string(),
        }
    }

    /// The event as a complete `text/event-stream` frame.
    pub fn frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data_json())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Result(_) | StreamEvent::Error { .. })
    }
}

/// Timer settings for a [`Relay`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub tick_interval: Duration,
    pub tick_step: u8,
    /// Highest value the ticker or a state floor may reach. Only the
    /// terminal event stands for 100.
    pub tick_ceiling: u8,
    pub heartbeat_interval: Duration,
    /// Capacity of the event channel.
    pub buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(800),
            tick_step: 3,
            tick_ceiling: 95,
            heartbeat_interval: Duration::from_secs(15),
            buffer: 32,
        }
    }
}

/// Monotonic progress counter capped below completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMeter {
    value: u8,
    ceiling: u8,
}

impl ProgressMeter {
    pub fn new(ceiling: u8) -> Self {
        Self { value: 0, ceiling: ceiling.min(99) }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Adds `step`; returns the new value if it changed.
    pub fn advance(&mut self, step: u8) -> Option<u8> {
        self.raise_to(self.value.saturating_add(step))
    }

    /// Raises to `floor` without ever lowering; returns the new value if it changed.
    pub fn raise_to(&mut self, floor: u8) -> Option<u8> {
        let next = floor.min(self.ceiling);
        if next > self.value {
            self.value = next;
            Some(next)
        } else {
            None
        }
    }
}

/// Runs analyses as event streams.
pub struct Relay<S, B> {
    analyzer: Arc<Analyzer<S, B>>,
    config: RelayConfig,
}

impl<S, B> Clone for Relay<S, B> {
    fn clone(&self) -> Self {
        Self { analyzer: Arc::clone(&self.analyzer), config: self.config.clone() }
    }
}

impl<S: PageSource + 'static, B: ModelBackend + 'static> Relay<S, B> {
    pub fn new(analyzer: Arc<Analyzer<S, B>>, config: RelayConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn analyzer(&self) -> &Arc<Analyzer<S, B>> {
        &self.analyzer
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Starts an analysis on its own task and returns the event receiver.
    ///
    /// Dropping the receiver cancels the analysis at the next event.
    pub fn spawn(&self, input: String, mode: Mode) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        let relay = self.clone();
        tokio::spawn(async move {
            let state = relay.run(&input, mode, &tx).await;
            debug!(?state, "relay finished");
        });
        rx
    }

    /// Drives one analysis to its terminal event, sending everything on `tx`.
    ///
    /// Returns the final state. `Failed` is also returned when the client
    /// went away before the terminal event.
    pub async fn run(&self, input: &str, mode: Mode, tx: &mpsc::Sender<StreamEvent>) -> RelayState {
        let (state_tx, mut state_rx) = watch::channel(RelayState::Idle);
        let analysis = self.analyzer.analyze_tracked(input, mode, &state_tx);
        tokio::pin!(analysis);

        let start = Instant::now();
        let mut ticker = interval_at(start + self.config.tick_interval, self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut heartbeat = interval_at(start + self.config.heartbeat_interval, self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut meter = ProgressMeter::new(self.config.tick_ceiling);

        loop {
            let event = tokio::select! {
                biased;
                outcome = &mut analysis => {
                    let (event, state) = match outcome {
                        Ok(report) => (StreamEvent::Result(Box::new(report)), RelayState::Done),
                        Err(err) => {
                            warn!(error = %err, "analysis failed");
                            state_tx.send_if_modified(|current| {
                                let moved = current.can_advance_to(RelayState::Failed);
                                if moved {
                                    *current = RelayState::Failed;
                                }
                                moved
                            });
                            (StreamEvent::Error { message: err.to_string() }, RelayState::Failed)
                        }
                    };
                    if tx.send(event).await.is_err() {
                        info!("client disconnected before the terminal event");
                    }
                    return state;
                }
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    let state = *state_rx.borrow_and_update();
                    if state.is_terminal() {
                        continue;
                    }
                    match meter.raise_to(state.progress_floor()) {
                        Some(value) => StreamEvent::Progress { value },
                        None => continue,
                    }
                }
                _ = ticker.tick() => match meter.advance(self.config.tick_step) {
                    Some(value) => StreamEvent::Progress { value },
                    None => continue,
                },
                _ = heartbeat.tick() => StreamEvent::ping_now(),
            };

            if tx.send(event).await.is_err() {
                info!(progress = meter.value(), "client disconnected, dropping analysis");
                return RelayState::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerConfig;
    use crate::model::{ModelError, ModelRequest};
    use crate::{PageliftError, Result};
    use serde_json::Value;
    use std::sync::Mutex;
    use url::Url;

    const PAGE: &str = "<html><head><title>Acme</title></head><body><h1>Ship faster</h1><p>Pricing and FAQ.</p></body></html>";

    struct SlowPage {
        delay: Duration,
        status: Option<u16>,
    }

    impl PageSource for SlowPage {
        async fn fetch(&self, url: &Url) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            match self.status {
                Some(status) => Err(PageliftError::HttpStatus { status, url: url.to_string() }),
                None => Ok(PAGE.to_string()),
            }
        }
    }

    struct Backend {
        live: &'static str,
        reply: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl ModelBackend for Backend {
        async fn respond(&self, model: &str, _request: &ModelRequest) -> std::result::Result<Value, ModelError> {
            self.calls.lock().unwrap().push(model.to_string());
            if model == self.live {
                Ok(serde_json::json!({ "output_text": self.reply }))
            } else {
                Err(ModelError::Status { status: 404, message: format!("model {model} not found") })
            }
        }
    }

    const REPLY: &str = r#"{"score":71,"summary":"Solid","key_findings":[],"quick_wins":["Add logos"]}"#;

    fn relay(page: SlowPage, backend: Backend) -> Relay<SlowPage, Backend> {
        let config = AnalyzerConfig::builder()
            .fallback_models(vec!["m1".into(), "m2".into(), "m3".into()])
            .build();
        Relay::new(Arc::new(Analyzer::new(page, backend, config)), RelayConfig::default())
    }

    fn backend(live: &'static str, reply: &'static str) -> Backend {
        Backend { live, reply, calls: Mutex::new(Vec::new()) }
    }

    async fn collect(relay: &Relay<SlowPage, Backend>) -> Vec<StreamEvent> {
        let mut rx = relay.spawn("acme.test".to_string(), Mode::Free);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn assert_stream_shape(events: &[StreamEvent]) {
        let terminal = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminal, 1, "exactly one terminal event");
        assert!(events.last().is_some_and(|e| e.is_terminal()), "terminal event comes last");

        let mut last = 0;
        for event in events {
            if let StreamEvent::Progress { value } = event {
                assert!(*value >= last, "progress went backwards");
                assert!(*value < 100);
                last = *value;
            }
        }
    }

    #[test]
    fn test_state_transitions() {
        assert!(RelayState::Idle.can_advance_to(RelayState::Fetching));
        assert!(RelayState::Parsing.can_advance_to(RelayState::Done));
        assert!(RelayState::ModelCalling.can_advance_to(RelayState::Failed));
        assert!(!RelayState::Idle.can_advance_to(RelayState::Parsing));
        assert!(!RelayState::Extracting.can_advance_to(RelayState::Fetching));
        assert!(!RelayState::Done.can_advance_to(RelayState::Failed));
        assert!(!RelayState::Failed.can_advance_to(RelayState::Fetching));
    }

    #[test]
    fn test_meter_is_monotonic_and_capped() {
        let mut meter = ProgressMeter::new(95);
        assert_eq!(meter.raise_to(35), Some(35));
        assert_eq!(meter.raise_to(25), None);
        assert_eq!(meter.advance(3), Some(38));
        assert_eq!(meter.raise_to(100), Some(95));
        assert_eq!(meter.advance(3), None);
        assert_eq!(meter.value(), 95);
    }

    #[test]
    fn test_event_frames() {
        assert_eq!(StreamEvent::Progress { value: 12 }.frame(), "event: progress\ndata: {\"value\":12}\n\n");
        let err = StreamEvent::Error { message: "boom".into() };
        assert_eq!(err.name(), "error");
        assert_eq!(err.data_json(), r#"{"message":"boom"}"#);
        assert!(StreamEvent::ping_now().frame().starts_with("event: ping\ndata: {\"t\":"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stream() {
        let relay = relay(SlowPage { delay: Duration::from_secs(20), status: None }, backend("m3", REPLY));
        let events = collect(&relay).await;

        assert_stream_shape(&events);
        assert!(events.iter().any(|e| matches!(e, StreamEvent::Ping { .. })), "heartbeat fired during a 20s fetch");
        assert!(events.iter().filter(|e| matches!(e, StreamEvent::Progress { .. })).count() > 5);
        match events.last() {
            Some(StreamEvent::Result(report)) => {
                assert_eq!(report.model.as_deref(), Some("m3"));
                assert_eq!(report.score, 71);
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_404_stream() {
        let relay = relay(SlowPage { delay: Duration::from_secs(2), status: Some(404) }, backend("m1", REPLY));
        let events = collect(&relay).await;

        assert_stream_shape(&events);
        assert!(!events.iter().any(|e| matches!(e, StreamEvent::Result(_))));
        match events.last() {
            Some(StreamEvent::Error { message }) => assert!(message.contains("404")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_model_output_stream() {
        let relay = relay(SlowPage { delay: Duration::ZERO, status: None }, backend("m1", "not json at all"));
        let events = collect(&relay).await;

        assert_stream_shape(&events);
        match events.last() {
            Some(StreamEvent::Error { message }) => assert!(message.to_lowercase().contains("invalid")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_models_stream() {
        let relay = relay(SlowPage { delay: Duration::ZERO, status: None }, backend("none", REPLY));
        let events = collect(&relay).await;

        assert_stream_shape(&events);
        assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
        assert_eq!(relay.analyzer().backend().calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_drops_analysis() {
        let relay = relay(SlowPage { delay: Duration::from_secs(30), status: None }, backend("m1", REPLY));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let state = relay.run("acme.test", Mode::Free, &tx).await;
        assert_eq!(state, RelayState::Failed);
        assert!(relay.analyzer().backend().calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_url_stream() {
        let relay = relay(SlowPage { delay: Duration::ZERO, status: None }, backend("m1", REPLY));
        let mut rx = relay.spawn("ftp://acme.test".to_string(), Mode::Free);
        let first = rx.recv().await;
        assert!(matches!(first, Some(StreamEvent::Error { .. })));
        assert!(rx.recv().await.is_none());
    }
}
