//! Composable wrappers over [`Executor`].
//!
//! Each wrapper preserves the capability interface exactly, so wrappers
//! stack in any order. Ordering decides granularity: stack [`WithStats`]
//! outside [`WithBackoff`] to observe one event per logical call, or inside
//! it to observe one event per physical attempt.

use std::time::Instant;

use crate::backoff::{BackoffFactory, Notify};
use crate::executor::{AttemptRequest, Executor, RawResponse};
use crate::stats::{stat_name, StatsSink};
use crate::validate::validate;
use crate::{RestiveError, Result};

/// Turns a delivered response with the wrong status into an
/// [`RestiveError::UnexpectedStatus`] error. The body is preserved inside
/// the error so outer layers can still see what the server said.
pub struct ExpectStatus<E> {
    inner: E,
    expected: u16,
}

impl<E> ExpectStatus<E> {
    pub fn new(inner: E, expected: u16) -> Self {
        Self { inner, expected }
    }
}

impl<E: Executor> Executor for ExpectStatus<E> {
    async fn execute(&self, request: &AttemptRequest) -> Result<RawResponse> {
        let response = self.inner.execute(request).await?;
        match validate(self.expected, response.status, &response.body) {
            Some(unexpected) => Err(RestiveError::UnexpectedStatus(unexpected)),
            None => Ok(response),
        }
    }
}

/// Observes every delegate invocation.
///
/// Always reports `request`, reports `request_error` when the delegate
/// errored, and reports `get_time` plus `response.<code>` whenever a status
/// was obtained, whether it arrived as a response or inside an
/// unexpected-status error.
pub struct WithStats<E, S> {
    inner: E,
    stats: S,
    name: String,
}

impl<E, S> WithStats<E, S> {
    pub fn new(inner: E, stats: S, name: impl Into<String>) -> Self {
        Self {
            inner,
            stats,
            name: name.into(),
        }
    }
}

impl<E: Executor, S: StatsSink> Executor for WithStats<E, S> {
    async fn execute(&self, request: &AttemptRequest) -> Result<RawResponse> {
        let start = Instant::now();
        let outcome = self.inner.execute(request).await;
        let end = Instant::now();

        self.stats.incr(&stat_name(&self.name, "request"));
        if outcome.is_err() {
            self.stats.incr(&stat_name(&self.name, "request_error"));
        }

        let status = match &outcome {
            Ok(response) => Some(response.status),
            Err(err) => err.status(),
        };
        if let Some(status) = status {
            self.stats.timing(&stat_name(&self.name, "get_time"), start, end);
            self.stats
                .incr(&stat_name(&self.name, &format!("response.{status}")));
        }

        outcome
    }
}

/// Re-invokes the inner executor until success, a non-retryable error, or
/// backoff exhaustion.
///
/// Transport errors and non-client-caused status mismatches retry; anything
/// else returns on the first occurrence. A fresh policy is drawn from the
/// factory for every call, so the wrapper itself stays shareable.
pub struct WithBackoff<E> {
    inner: E,
    make_backoff: BackoffFactory,
    notify: Option<Notify>,
}

impl<E> WithBackoff<E> {
    pub fn new(inner: E, make_backoff: BackoffFactory) -> Self {
        Self {
            inner,
            make_backoff,
            notify: None,
        }
    }

    /// Called with the attempt error and the upcoming wait before each sleep.
    pub fn with_notify(mut self, notify: Notify) -> Self {
        self.notify = Some(notify);
        self
    }
}

impl<E: Executor> Executor for WithBackoff<E> {
    async fn execute(&self, request: &AttemptRequest) -> Result<RawResponse> {
        let mut backoff = (self.make_backoff)();
        backoff.reset();
        loop {
            let err = match self.inner.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            let Some(wait) = backoff.next_delay() else {
                return Err(err);
            };
            if let Some(notify) = &self.notify {
                notify(&err, wait);
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(wait_ms = wait.as_millis() as u64, "retrying after backoff");
            tokio::time::sleep(wait).await;
        }
    }
}
