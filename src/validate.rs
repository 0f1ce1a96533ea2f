/// The request completed but the response status was not the expected one.
///
/// Carries the raw body so callers can inspect whatever the server said.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{expected}:{received}:{}", String::from_utf8_lossy(.body))]
pub struct UnexpectedResponse {
    /// Status the descriptor declared as success.
    pub expected: u16,
    /// Status actually received.
    pub received: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl UnexpectedResponse {
    /// True iff the received status lays the fault with the request (4xx).
    ///
    /// Anything else, 5xx included, classifies as server-caused. This is the
    /// sole signal the retry layers use: client-caused mismatches never
    /// retry, server-caused ones do.
    pub fn is_client_caused(&self) -> bool {
        (400..500).contains(&self.received)
    }
}

/// Compares an actual status against the expected one.
///
/// Pure: no side effects, no retry decisions. Returns the mismatch payload
/// when the statuses differ.
pub fn validate(expected: u16, actual: u16, body: &[u8]) -> Option<UnexpectedResponse> {
    if actual == expected {
        return None;
    }

    Some(UnexpectedResponse {
        expected,
        received: actual,
        body: body.to_vec(),
    })
}
