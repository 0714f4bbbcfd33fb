//! Request dispatch with retry and injection recovery.
//!
//! The scanner may not be present in the page yet (never injected, or the
//! page navigated since injection), so every request tolerates a "no
//! receiver" failure: retry with backoff, then inject the scanner and issue
//! exactly one final attempt. Failures the scanner itself reports are final
//! answers and are never retried; only communication failures are.

use crate::collector::{COLLECTOR_JS, DISPATCH_JS};
use crate::config::HarvesterConfig;
use crate::error::{HarvestError, Result};
use crate::protocol::{PingStatus, ProbeRequest, ProbeResponse};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// A transport-level failure (no receiver, dead session, script rejected)
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes scripts in the page context.
///
/// The seam exists so the retry state machine can be driven without a
/// browser; the real implementation is the WebDriver client.
pub trait ScannerTransport {
    fn run_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = std::result::Result<Value, TransportError>>;
}

impl ScannerTransport for fantoccini::Client {
    async fn run_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> std::result::Result<Value, TransportError> {
        fantoccini::Client::execute(self, script, args)
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}

/// One request's position in the send lifecycle
#[derive(Debug)]
enum SendState {
    /// Sending and awaiting a response
    Attempting { attempt: u32 },
    /// Backing off before the next attempt
    Retrying { attempt: u32 },
    /// Re-injecting the scanner after exhausted attempts
    Injecting,
    /// The single post-injection attempt
    FinalAttempt,
}

enum AttemptOutcome {
    /// A response crossed the boundary; the request is settled either way
    Completed(Result<Value>),
    /// Nothing answered; eligible for retry/injection
    NoReceiver(String),
}

/// Sends typed requests to the in-page scanner
pub struct Messenger<T: ScannerTransport> {
    transport: T,
    config: HarvesterConfig,
}

impl<T: ScannerTransport> Messenger<T> {
    pub fn new(transport: T, config: HarvesterConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the messenger, returning the transport (used to end a session)
    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    /// Sends a request, recovering from a missing scanner.
    ///
    /// Walks Attempting → Retrying (backoff × attempt) → Injecting → a single
    /// final attempt. A response with `success: false` settles the request as
    /// a scanner error without retrying; exhausting recovery yields
    /// `PageUnreachable`, which callers surface once and do not retry.
    pub async fn send(&self, request: &ProbeRequest) -> Result<Value> {
        let payload = serde_json::to_value(request)?;
        let mut state = SendState::Attempting { attempt: 1 };

        loop {
            state = match state {
                SendState::Attempting { attempt } => match self.attempt(&payload).await {
                    AttemptOutcome::Completed(settled) => return settled,
                    AttemptOutcome::NoReceiver(reason) => {
                        if attempt < self.config.max_attempts {
                            ::log::debug!("Send attempt {} failed: {}", attempt, reason);
                            SendState::Retrying { attempt }
                        } else {
                            ::log::info!(
                                "No response after {} attempts ({}), injecting scanner",
                                attempt,
                                reason
                            );
                            SendState::Injecting
                        }
                    }
                },
                SendState::Retrying { attempt } => {
                    sleep(self.config.retry_delay(attempt)).await;
                    SendState::Attempting { attempt: attempt + 1 }
                }
                SendState::Injecting => {
                    self.inject().await?;
                    SendState::FinalAttempt
                }
                SendState::FinalAttempt => match self.attempt(&payload).await {
                    AttemptOutcome::Completed(settled) => return settled,
                    AttemptOutcome::NoReceiver(reason) => {
                        ::log::error!("Scanner unreachable after injection: {}", reason);
                        return Err(HarvestError::PageUnreachable(reason));
                    }
                },
            };
        }
    }

    async fn attempt(&self, payload: &Value) -> AttemptOutcome {
        match self
            .transport
            .run_script(DISPATCH_JS, vec![payload.clone()])
            .await
        {
            Ok(raw) => match serde_json::from_value::<ProbeResponse>(raw) {
                Ok(response) if response.is_scanner_missing() => {
                    AttemptOutcome::NoReceiver("scanner not installed".to_string())
                }
                Ok(response) => AttemptOutcome::Completed(response.into_data()),
                Err(err) => {
                    AttemptOutcome::Completed(Err(HarvestError::Protocol(err.to_string())))
                }
            },
            Err(err) => AttemptOutcome::NoReceiver(err.to_string()),
        }
    }

    /// Executes the collector install script and waits for it to settle.
    /// The install itself is idempotent on the page side.
    async fn inject(&self) -> Result<()> {
        self.transport
            .run_script(COLLECTOR_JS, Vec::new())
            .await
            .map_err(|e| HarvestError::PageUnreachable(format!("injection failed: {e}")))?;
        sleep(self.config.injection_settle()).await;
        Ok(())
    }

    /// Waits until the document has finished loading.
    ///
    /// "Not ready yet" is a scheduling concern, not a caller-visible error;
    /// only a page that never settles within the configured window fails.
    pub async fn wait_for_ready(&self) -> Result<()> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.ready_timeout_ms);

        loop {
            let data = self.send(&ProbeRequest::Ping).await?;
            let status: PingStatus = serde_json::from_value(data)?;
            if status.ready {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HarvestError::PageUnreachable(
                    "page never finished loading".to_string(),
                ));
            }
            ::log::debug!("Document still loading ({}), waiting", status.ready_state);
            sleep(Duration::from_millis(100)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// What the mock page does when the dispatch shim runs
    enum MockMode {
        /// Scanner answers once present; absent until injected
        MissingUntilInjected,
        /// Transport rejects every script, including the injection
        Dead,
        /// Scanner present, reports a failure of its own
        ScannerError(&'static str),
        /// Transport errors N times, then the scanner answers
        FlakyTransport(u32),
        /// Document finishes loading after N pings
        LoadingForPings(u32),
    }

    struct MockTransport {
        mode: MockMode,
        state: Mutex<MockState>,
    }

    #[derive(Default)]
    struct MockState {
        injected: bool,
        dispatch_calls: u32,
        inject_calls: u32,
    }

    impl MockTransport {
        fn new(mode: MockMode) -> Self {
            Self {
                mode,
                state: Mutex::new(MockState::default()),
            }
        }

        fn dispatch_calls(&self) -> u32 {
            self.state.lock().unwrap().dispatch_calls
        }

        fn inject_calls(&self) -> u32 {
            self.state.lock().unwrap().inject_calls
        }
    }

    impl ScannerTransport for MockTransport {
        async fn run_script(
            &self,
            script: &str,
            _args: Vec<Value>,
        ) -> std::result::Result<Value, TransportError> {
            let mut state = self.state.lock().unwrap();

            if script == COLLECTOR_JS {
                state.inject_calls += 1;
                return match self.mode {
                    MockMode::Dead => Err(TransportError("script rejected".to_string())),
                    _ => {
                        state.injected = true;
                        Ok(Value::Null)
                    }
                };
            }

            state.dispatch_calls += 1;
            match &self.mode {
                MockMode::MissingUntilInjected => {
                    if state.injected {
                        Ok(json!({"success": true, "data": {"ready": true, "readyState": "complete"}}))
                    } else {
                        Ok(json!({"success": false, "error": "scanner-not-installed"}))
                    }
                }
                MockMode::Dead => Err(TransportError("no session".to_string())),
                MockMode::ScannerError(message) => {
                    Ok(json!({"success": false, "error": message}))
                }
                MockMode::FlakyTransport(failures) => {
                    if state.dispatch_calls <= *failures {
                        Err(TransportError("channel closed".to_string()))
                    } else {
                        Ok(json!({"success": true, "data": {"ok": true}}))
                    }
                }
                MockMode::LoadingForPings(loading) => {
                    if state.dispatch_calls <= *loading {
                        Ok(json!({"success": true, "data": {"ready": false, "readyState": "loading"}}))
                    } else {
                        Ok(json!({"success": true, "data": {"ready": true, "readyState": "complete"}}))
                    }
                }
            }
        }
    }

    fn fast_config() -> HarvesterConfig {
        HarvesterConfig {
            retry_base_ms: 1,
            injection_settle_ms: 1,
            ready_timeout_ms: 500,
            ..HarvesterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_injection_recovers_a_missing_scanner() {
        let messenger = Messenger::new(
            MockTransport::new(MockMode::MissingUntilInjected),
            fast_config(),
        );

        let data = messenger.send(&ProbeRequest::Ping).await.unwrap();
        assert_eq!(data["ready"], true);

        // Three regular attempts, one injection, one final attempt.
        assert_eq!(messenger.transport().dispatch_calls(), 4);
        assert_eq!(messenger.transport().inject_calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_without_injection() {
        let messenger =
            Messenger::new(MockTransport::new(MockMode::FlakyTransport(2)), fast_config());

        let data = messenger.send(&ProbeRequest::CaptureSnapshot).await.unwrap();
        assert_eq!(data["ok"], true);
        assert_eq!(messenger.transport().dispatch_calls(), 3);
        assert_eq!(messenger.transport().inject_calls(), 0);
    }

    #[tokio::test]
    async fn test_dead_page_surfaces_exactly_one_error() {
        let messenger = Messenger::new(MockTransport::new(MockMode::Dead), fast_config());

        let err = messenger.send(&ProbeRequest::Ping).await.unwrap_err();
        assert!(matches!(err, HarvestError::PageUnreachable(_)));

        // Attempts were exhausted and the injection failed; no final attempt.
        assert_eq!(messenger.transport().dispatch_calls(), 3);
        assert_eq!(messenger.transport().inject_calls(), 1);
    }

    #[tokio::test]
    async fn test_scanner_reported_errors_are_not_retried() {
        let messenger = Messenger::new(
            MockTransport::new(MockMode::ScannerError("element not found")),
            fast_config(),
        );

        let err = messenger.send(&ProbeRequest::ClearHighlights).await.unwrap_err();
        assert!(matches!(err, HarvestError::Scanner(_)));
        assert_eq!(messenger.transport().dispatch_calls(), 1);
        assert_eq!(messenger.transport().inject_calls(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_ready_polls_until_loaded() {
        let messenger = Messenger::new(
            MockTransport::new(MockMode::LoadingForPings(2)),
            fast_config(),
        );

        messenger.wait_for_ready().await.unwrap();
        assert_eq!(messenger.transport().dispatch_calls(), 3);
    }
}
