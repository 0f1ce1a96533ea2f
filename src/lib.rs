//! `restive` is a resilient HTTP request executor.
//!
//! A request is described once ([`RequestDescriptor`]) and issued through a
//! client that layers status validation, backoff-driven retry, and
//! per-attempt statistics over a minimal [`Executor`] capability:
//! - [`RestiveClient::call_json`] — JSON in, JSON out
//! - [`RestiveClient::call_raw`] — wire-level status and body
//! - [`decorate`] — the same concerns as independently stackable wrappers

pub mod backoff;
pub mod decorate;

mod client;
mod error;
mod executor;
mod request;
mod stats;
mod validate;

pub use backoff::{Backoff, BackoffFactory, ExponentialBackoff, FixedBackoff, NoBackoff, Notify};
pub use client::RestiveClient;
pub use error::RestiveError;
pub use executor::{AttemptRequest, Executor, HttpExecutor, RawResponse};
pub use request::RequestDescriptor;
pub use stats::{NoopStats, StatsSink};
pub use validate::{validate, UnexpectedResponse};

pub type Result<T> = std::result::Result<T, RestiveError>;
