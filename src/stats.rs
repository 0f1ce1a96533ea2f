use std::time::Instant;

/// Receives per-attempt and per-call observations.
///
/// The sink is the only component besides the executor shared across
/// concurrent calls; implementations must be safe for concurrent
/// invocation. Every observation is fire-and-forget.
///
/// Names are dot-joined `<callName>.<event>` strings. Recognized events:
/// `request`, `request_error`, `request_format_error`, `get_time`,
/// `backoff`, and `response.<statusCode>`.
pub trait StatsSink: Send + Sync {
    /// Increments the named counter.
    fn incr(&self, name: &str);
    /// Reports a timing for the named stat.
    fn timing(&self, name: &str, start: Instant, end: Instant);
}

/// Throws stats on the floor.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStats;

impl StatsSink for NoopStats {
    fn incr(&self, _name: &str) {}

    fn timing(&self, _name: &str, _start: Instant, _end: Instant) {}
}

pub(crate) fn stat_name(call: &str, event: &str) -> String {
    format!("{call}.{event}")
}

#[cfg(test)]
mod tests {
    use super::stat_name;

    #[test]
    fn stat_names_are_dot_joined() {
        assert_eq!(stat_name("unit-test", "request"), "unit-test.request");
        assert_eq!(stat_name("unit-test", "response.200"), "unit-test.response.200");
    }
}
