use crate::error::{AwxError, Result};
use std::time::{Duration, Instant};

/// Per-call context carrying an optional deadline.
///
/// The deadline covers the whole call, including a token exchange the call
/// may trigger. Each request handed to the transport gets the time that is
/// left as its timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context without a deadline
    pub fn background() -> Self {
        CallContext { deadline: None }
    }

    /// Context expiring `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        CallContext {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Context expiring at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        CallContext {
            deadline: Some(deadline),
        }
    }

    /// Deadline of this context, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline.
    ///
    /// Returns `Ok(None)` without a deadline and `DeadlineExceeded` once it
    /// has passed.
    pub fn remaining(&self) -> Result<Option<Duration>> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    Err(AwxError::DeadlineExceeded)
                } else {
                    Ok(Some(left))
                }
            }
        }
    }
}
