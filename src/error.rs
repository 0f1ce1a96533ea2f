use crate::validate::UnexpectedResponse;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RestiveError {
    /// The descriptor could not be turned into a valid physical request.
    ///
    /// Never retried: a bad URL or header is a configuration defect, not a
    /// transient fault.
    #[error("request format error: {0}")]
    RequestFormat(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response arrived with a status other than the expected one.
    #[error("unexpected response {0}")]
    UnexpectedStatus(#[from] UnexpectedResponse),
    /// Request body could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(String),
    /// Expected status matched but the payload could not be parsed.
    ///
    /// Never retried: a well-formed status with an unparseable body means the
    /// caller is pointed at the wrong endpoint.
    #[error("decode error: {0}")]
    Decode(String),
    /// The per-call deadline elapsed before the call could finish.
    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

impl RestiveError {
    /// Returns the unexpected-response payload when that is what this is.
    pub fn as_unexpected(&self) -> Option<&UnexpectedResponse> {
        match self {
            Self::UnexpectedStatus(unexpected) => Some(unexpected),
            _ => None,
        }
    }

    /// Status code observed on the wire, when one was obtained.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus(unexpected) => Some(unexpected.received),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly produce a different outcome.
    ///
    /// Transport failures and non-client-caused status mismatches are
    /// retryable. Everything else fails fast on the first occurrence.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::UnexpectedStatus(unexpected) => !unexpected.is_client_caused(),
            Self::RequestFormat(_) | Self::Encode(_) | Self::Decode(_) | Self::DeadlineExceeded => {
                false
            }
        }
    }
}
