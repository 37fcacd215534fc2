use std::time::Duration;

use sentinela_client::error::Error as ClientError;

/// Automatic retries stop after this many consecutive failures.
pub const RETRY_CAP: u32 = 10;

const REJECTED_DELAY: Duration = Duration::from_secs(10);
const NOT_PROVISIONED_DELAY: Duration = Duration::from_secs(5);
const CONNECTIVITY_DELAY: Duration = Duration::from_secs(5);
const OTHER_DELAY: Duration = Duration::from_secs(10);

/// Why a connection attempt (or a live session) went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The backend refused the offer outright.
    Rejected,
    /// The backend has no stream for this camera yet.
    NotProvisioned,
    /// An established transport dropped.
    ConnectivityLost,
    Other,
}

impl FailureClass {
    pub fn from_signalling(error: &ClientError) -> Self {
        match error.signalling_status() {
            Some(400) => Self::Rejected,
            Some(404) => Self::NotProvisioned,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    cap: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { cap: RETRY_CAP }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn with_cap(cap: u32) -> Self {
        Self { cap }
    }

    /// `attempt` is the 1-based count of consecutive failures so far.
    pub fn decide(&self, class: FailureClass, attempt: u32) -> RetryDecision {
        RetryDecision {
            should_retry: attempt <= self.cap,
            delay: delay_for(class),
        }
    }
}

fn delay_for(class: FailureClass) -> Duration {
    match class {
        FailureClass::Rejected => REJECTED_DELAY,
        FailureClass::NotProvisioned => NOT_PROVISIONED_DELAY,
        FailureClass::ConnectivityLost => CONNECTIVITY_DELAY,
        FailureClass::Other => OTHER_DELAY,
    }
}
