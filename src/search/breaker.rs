use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::configuration::BreakerSettings;

/// CLOSED/OPEN/HALF_OPEN transitions for a single named breaker (spec.md
/// §4.2, C3). One instance wraps every [`crate::search::SearchClient`]
/// method independently — `search`, `embed_images`, `create_index`, and
/// `delete_index` each get their own breaker so a burst of search failures
/// doesn't trip the embed path and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStateKind {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Outcome {
    success: bool,
    slow: bool,
}

#[derive(Debug)]
enum State {
    Closed { window: VecDeque<Outcome> },
    Open { opened_at: Instant },
    HalfOpen { permits_issued: usize, successes: usize },
}

pub struct CircuitBreaker {
    name: String,
    config: BreakerSettings,
    inner: Mutex<State>,
}

#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    #[error("circuit breaker '{0}' is open")]
    Open(String),
    #[error(transparent)]
    Upstream(E),
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(State::Closed {
                window: VecDeque::new(),
            }),
        }
    }

    pub fn state(&self) -> BreakerStateKind {
        match &*self.inner.lock().unwrap() {
            State::Closed { .. } => BreakerStateKind::Closed,
            State::Open { .. } => BreakerStateKind::Open,
            State::HalfOpen { .. } => BreakerStateKind::HalfOpen,
        }
    }

    /// Runs `f` through the breaker, recording success/failure/slowness and
    /// advancing the state machine. `f`'s future is given `timeout` to
    /// complete; expiry counts as a failure (spec.md §4.1's "expiry is
    /// treated as failure").
    pub async fn call<F, Fut, T, E>(
        &self,
        timeout: Duration,
        f: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.acquire()?;

        let start = Instant::now();
        let outcome = tokio::time::timeout(timeout, f()).await;
        let slow = start.elapsed() >= self.config.slow_call_duration();

        match outcome {
            Ok(Ok(value)) => {
                self.record(true, slow);
                Ok(value)
            }
            Ok(Err(e)) => {
                self.record(false, slow);
                Err(BreakerError::Upstream(e))
            }
            Err(_elapsed) => {
                self.record(false, true);
                Err(BreakerError::Open(format!(
                    "{} call exceeded {:?} deadline",
                    self.name, timeout
                )))
            }
        }
    }

    fn acquire(&self) -> Result<(), BreakerError<std::convert::Infallible>> {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            State::Closed { .. } => Ok(()),
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.config.open_duration() {
                    *inner = State::HalfOpen {
                        permits_issued: 1,
                        successes: 0,
                    };
                    Ok(())
                } else {
                    Err(BreakerError::Open(self.name.clone()))
                }
            }
            State::HalfOpen { permits_issued, .. } => {
                if *permits_issued < self.config.half_open_probes {
                    *permits_issued += 1;
                    Ok(())
                } else {
                    Err(BreakerError::Open(self.name.clone()))
                }
            }
        }
    }

    fn record(&self, success: bool, slow: bool) {
        let mut inner = self.inner.lock().unwrap();
        match &mut *inner {
            State::HalfOpen { successes, .. } => {
                if !success {
                    *inner = State::Open {
                        opened_at: Instant::now(),
                    };
                    return;
                }
                *successes += 1;
                if *successes >= self.config.half_open_probes {
                    *inner = State::Closed {
                        window: VecDeque::new(),
                    };
                }
            }
            State::Closed { window } => {
                window.push_back(Outcome { success, slow });
                if window.len() > self.config.window {
                    window.pop_front();
                }

                if window.len() >= self.config.minimum_calls {
                    let total = window.len() as f64;
                    let failures = window.iter().filter(|o| !o.success).count() as f64;
                    let slow_calls = window.iter().filter(|o| o.slow).count() as f64;

                    if failures / total >= self.config.failure_rate_threshold
                        || slow_calls / total >= self.config.slow_call_rate_threshold
                    {
                        *inner = State::Open {
                            opened_at: Instant::now(),
                        };
                    }
                }
            }
            State::Open { .. } => {
                // A call recorded while open means `acquire` just flipped us
                // to half-open for this caller; nothing to do here, the
                // half-open branch above handles it on the next record.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BreakerSettings {
        BreakerSettings {
            window: 10,
            minimum_calls: 4,
            failure_rate_threshold: 0.5,
            slow_call_duration_s: 10,
            slow_call_rate_threshold: 0.5,
            open_duration_s: 60,
            half_open_probes: 2,
        }
    }

    async fn ok_call() -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn fail_call() -> Result<(), anyhow::Error> {
        Err(anyhow::anyhow!("boom"))
    }

    #[tokio::test]
    async fn closed_breaker_passes_calls_through() {
        let breaker = CircuitBreaker::new("test", settings());
        for _ in 0..3 {
            breaker.call(Duration::from_secs(1), ok_call).await.unwrap();
        }
        assert_eq!(breaker.state(), BreakerStateKind::Closed);
    }

    #[tokio::test]
    async fn failure_burst_opens_the_breaker() {
        let breaker = CircuitBreaker::new("test", settings());
        for _ in 0..4 {
            let _ = breaker.call(Duration::from_secs(1), fail_call).await;
        }
        assert_eq!(breaker.state(), BreakerStateKind::Open);
    }

    #[tokio::test]
    async fn half_open_closes_after_enough_successes() {
        let mut cfg = settings();
        cfg.open_duration_s = 0;
        let breaker = CircuitBreaker::new("test", cfg);

        for _ in 0..4 {
            let _ = breaker.call(Duration::from_secs(1), fail_call).await;
        }
        assert_eq!(breaker.state(), BreakerStateKind::Open);

        for _ in 0..2 {
            breaker.call(Duration::from_secs(1), ok_call).await.unwrap();
        }
        assert_eq!(breaker.state(), BreakerStateKind::Closed);
    }

    #[tokio::test]
    async fn half_open_reopens_on_any_failure() {
        let mut cfg = settings();
        cfg.open_duration_s = 0;
        let breaker = CircuitBreaker::new("test", cfg);

        for _ in 0..4 {
            let _ = breaker.call(Duration::from_secs(1), fail_call).await;
        }
        assert_eq!(breaker.state(), BreakerStateKind::Open);

        let _ = breaker.call(Duration::from_secs(1), fail_call).await;
        assert_eq!(breaker.state(), BreakerStateKind::Open);
    }
}
