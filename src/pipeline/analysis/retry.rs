//! Retry governor for the upstream analysis call.
//!
//! Fixed budget, no exponential growth: at most three attempts, a flat
//! two-second pause after a rate-limit error, and an immediate give-up when
//! the upstream asks for a longer pause than the patient should wait.

use std::time::Duration;

use super::types::Sleeper;
use super::AnalysisError;

/// What the governor does after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Succeed,
    Retry(Duration),
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause before the next attempt after a rate-limit error.
    pub retry_delay: Duration,
    /// Upstream wait hints above this abandon retrying.
    pub max_suggested_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            max_suggested_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after `attempt` (1-based) produced `outcome`.
    pub fn decide<T>(&self, attempt: u32, outcome: &Result<T, AnalysisError>) -> RetryStep {
        let err = match outcome {
            Ok(_) => return RetryStep::Succeed,
            Err(e) => e,
        };

        let AnalysisError::RateLimited { retry_after } = err else {
            return RetryStep::Fail;
        };
        if attempt >= self.max_attempts {
            return RetryStep::Fail;
        }
        match retry_after {
            Some(wait) if *wait > self.max_suggested_wait => RetryStep::Fail,
            _ => RetryStep::Retry(self.retry_delay),
        }
    }

    /// Run `call` under this policy, sleeping between attempts.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, mut call: F) -> Result<T, AnalysisError>
    where
        F: FnMut(u32) -> Result<T, AnalysisError>,
    {
        let mut attempt = 1;
        loop {
            let outcome = call(attempt);
            match self.decide(attempt, &outcome) {
                RetryStep::Succeed | RetryStep::Fail => {
                    if let Err(e) = &outcome {
                        tracing::warn!(attempt, error = %e, "Upstream analysis attempt failed, giving up");
                    }
                    return outcome;
                }
                RetryStep::Retry(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream rate limited, retrying"
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
