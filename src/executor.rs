use std::future::Future;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::{RestiveError, Result};

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// One physical attempt, fully materialized: absolute URL, headers, and an
/// owned body that replays on every retry.
#[derive(Clone, Debug)]
pub struct AttemptRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Status and body of one completed attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one request/response cycle.
///
/// Implementations must be safe for concurrent use and must not retry
/// internally; retry belongs to the layers above. Decorators in
/// [`crate::decorate`] wrap this same capability, so the trait is the seam
/// the whole crate composes over.
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        request: &AttemptRequest,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// `reqwest`-backed executor with a per-attempt timeout.
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ATTEMPT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for HttpExecutor {
    async fn execute(&self, request: &AttemptRequest) -> Result<RawResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(RestiveError::Transport)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(RestiveError::Transport)?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}
