use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backoff::{factory, Backoff, BackoffFactory, NoBackoff, Notify};
use crate::executor::{AttemptRequest, Executor, HttpExecutor, RawResponse};
use crate::request::RequestDescriptor;
use crate::stats::{stat_name, NoopStats, StatsSink};
use crate::validate::validate;
use crate::{RestiveError, Result};

/// Issues logical calls over a single [`Executor`], retrying transient
/// failures under a pluggable backoff policy and reporting per-attempt
/// stats.
///
/// The client is cheap to share: every logical call draws a fresh backoff
/// instance from the factory, so no mutable state crosses concurrent calls.
pub struct RestiveClient<E = HttpExecutor> {
    executor: E,
    base_url: Url,
    stats: Arc<dyn StatsSink>,
    make_backoff: BackoffFactory,
    notify: Option<Notify>,
    deadline: Option<Duration>,
}

impl fmt::Debug for RestiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestiveClient")
            .field("base_url", &self.base_url.as_str())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl RestiveClient<HttpExecutor> {
    /// Creates a client over the default `reqwest` executor.
    ///
    /// A malformed base URL errors here, before any physical attempt.
    /// Defaults: no retry, no stats, no deadline.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|err| RestiveError::RequestFormat(format!("invalid base url: {err}")))?;
        Ok(Self {
            executor: HttpExecutor::new(),
            base_url,
            stats: Arc::new(NoopStats),
            make_backoff: factory(|| NoBackoff),
            notify: None,
            deadline: None,
        })
    }
}

impl<E: Executor> RestiveClient<E> {
    /// Swaps the executor, keeping every other setting.
    pub fn with_executor<E2: Executor>(self, executor: E2) -> RestiveClient<E2> {
        RestiveClient {
            executor,
            base_url: self.base_url,
            stats: self.stats,
            make_backoff: self.make_backoff,
            notify: self.notify,
            deadline: self.deadline,
        }
    }

    /// Sets the sink observations are reported to.
    pub fn with_stats(mut self, stats: impl StatsSink + 'static) -> Self {
        self.stats = Arc::new(stats);
        self
    }

    /// Sets the backoff policy via a per-call factory.
    pub fn with_backoff<B, F>(mut self, make: F) -> Self
    where
        B: Backoff + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.make_backoff = factory(make);
        self
    }

    /// Called with the attempt error and the upcoming wait before each
    /// backoff sleep. Must not block for long.
    pub fn with_notify(mut self, notify: Notify) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Bounds the whole logical call, attempts and backoff sleeps included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Issues the call, serializing `body` as JSON when present and decoding
    /// the response body into `T`.
    ///
    /// A response with the expected status but an unparseable body is a
    /// [`RestiveError::Decode`] and is never retried.
    pub async fn call_json<B, T>(&self, descriptor: &RequestDescriptor, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = match body {
            Some(value) => Some(
                serde_json::to_vec(value)
                    .map_err(|err| RestiveError::Encode(err.to_string()))?,
            ),
            None => None,
        };
        self.run(descriptor, body, |response| {
            serde_json::from_slice(&response.body)
                .map_err(|err| RestiveError::Decode(err.to_string()))
        })
        .await
    }

    /// Issues the call and returns the wire-level outcome without decoding.
    ///
    /// Validation and retry still apply; only the JSON step is skipped.
    pub async fn call_raw(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        self.run(descriptor, body, Ok).await
    }

    async fn run<T>(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
        finish: impl Fn(RawResponse) -> Result<T>,
    ) -> Result<T> {
        let name = descriptor.name.as_str();
        let request = match self.attempt_request(descriptor, body) {
            Ok(request) => request,
            Err(err) => {
                self.stats.incr(&stat_name(name, "request_format_error"));
                return Err(err);
            }
        };

        let deadline = self.deadline.map(|limit| Instant::now() + limit);
        let mut backoff = (self.make_backoff)();
        backoff.reset();

        loop {
            let start = Instant::now();
            let outcome = self.execute_attempt(&request, deadline).await;
            let end = Instant::now();

            let err = match outcome {
                Ok(response) => {
                    self.stats.timing(&stat_name(name, "get_time"), start, end);
                    self.stats
                        .incr(&stat_name(name, &format!("response.{}", response.status)));

                    match validate(descriptor.expected_status, response.status, &response.body) {
                        None => {
                            return match finish(response) {
                                Ok(value) => {
                                    self.stats.incr(&stat_name(name, "request"));
                                    Ok(value)
                                }
                                Err(err) => {
                                    self.stats.incr(&stat_name(name, "request_error"));
                                    Err(err)
                                }
                            };
                        }
                        Some(unexpected) if unexpected.is_client_caused() => {
                            self.stats.incr(&stat_name(name, "request_error"));
                            return Err(RestiveError::UnexpectedStatus(unexpected));
                        }
                        Some(unexpected) => RestiveError::UnexpectedStatus(unexpected),
                    }
                }
                Err(err) if !err.is_retryable() => {
                    self.stats.incr(&stat_name(name, "request_error"));
                    return Err(err);
                }
                Err(err) => err,
            };

            let Some(wait) = backoff.next_delay() else {
                return Err(err);
            };
            if let Some(deadline) = deadline {
                // Not enough budget left for the sleep plus another attempt.
                if Instant::now() + wait >= deadline {
                    return Err(err);
                }
            }

            self.stats.incr(&stat_name(name, "backoff"));
            if let Some(notify) = &self.notify {
                notify(&err, wait);
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(
                call = name,
                wait_ms = wait.as_millis() as u64,
                "retrying after backoff"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn execute_attempt(
        &self,
        request: &AttemptRequest,
        deadline: Option<Instant>,
    ) -> Result<RawResponse> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(RestiveError::DeadlineExceeded);
                }
                tokio::time::timeout(remaining, self.executor.execute(request))
                    .await
                    .map_err(|_| RestiveError::DeadlineExceeded)?
            }
            None => self.executor.execute(request).await,
        }
    }

    fn attempt_request(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
    ) -> Result<AttemptRequest> {
        let url = descriptor.url(&self.base_url)?;
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(accept) = &descriptor.accept {
            headers.insert(ACCEPT, parse_header_value(accept)?);
        }
        if let Some(content_type) = &descriptor.content_type {
            headers.insert(CONTENT_TYPE, parse_header_value(content_type)?);
        }
        Ok(AttemptRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body,
        })
    }
}

fn parse_header_value(value: &str) -> Result<HeaderValue> {
    value
        .parse()
        .map_err(|_| RestiveError::RequestFormat(format!("invalid header value {value:?}")))
}
