use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Processor failing, reject without calling it
    HalfOpen, // One trial charge in flight
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

/// Guards the processor against hammering while it is unreachable.
///
/// Only transient failures count. A declined card is a healthy answer from
/// the processor and resets the failure streak.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: usize,
    reset_timeout: Duration,
    inner: Mutex<Breaker>,
}

impl CircuitBreaker {
    pub fn new(name: &str, failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(Breaker {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Whether a processor call may go out now.
    pub async fn allow_request(&self) -> bool {
        let mut breaker = self.inner.lock().await;
        match breaker.state {
            CircuitState::Closed => true,
            CircuitState::Open | CircuitState::HalfOpen => {
                // A trial that never reported back is replaced after another timeout.
                let cooled_down = breaker
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.reset_timeout);
                if cooled_down {
                    breaker.state = CircuitState::HalfOpen;
                    breaker.opened_at = Some(Instant::now());
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                }
                cooled_down
            }
        }
    }

    pub async fn record_success(&self) {
        let mut breaker = self.inner.lock().await;
        if breaker.state != CircuitState::Closed {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        breaker.state = CircuitState::Closed;
        breaker.consecutive_failures = 0;
        breaker.opened_at = None;
    }

    pub async fn record_failure(&self) {
        let mut breaker = self.inner.lock().await;
        breaker.consecutive_failures += 1;

        if breaker.state == CircuitState::HalfOpen || breaker.consecutive_failures >= self.failure_threshold {
            breaker.state = CircuitState::Open;
            breaker.opened_at = Some(Instant::now());
            tracing::error!(
                "Circuit Breaker [{}] TRIPPED to Open. Failures: {}",
                self.name,
                breaker.consecutive_failures
            );
        }
    }
}
