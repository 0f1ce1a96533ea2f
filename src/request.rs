use reqwest::{Method, Url};

use crate::{RestiveError, Result};

/// Immutable description of a logical request, independent of the transport.
///
/// One descriptor serves one logical call; the `name` labels every stat the
/// call emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Logical name used as the stats prefix.
    pub name: String,
    /// HTTP method.
    pub method: Method,
    /// Path resolved against the client's base URL.
    pub path: String,
    /// Optional raw query string, appended verbatim.
    pub query: Option<String>,
    /// Status code that counts as success.
    pub expected_status: u16,
    /// Optional `Accept` header value.
    pub accept: Option<String>,
    /// Optional `Content-Type` header value.
    pub content_type: Option<String>,
}

impl RequestDescriptor {
    /// GET expecting 200. Multiple accept values are joined with `", "`.
    pub fn get(name: impl Into<String>, path: impl Into<String>, accept: &[&str]) -> Self {
        Self {
            name: name.into(),
            method: Method::GET,
            path: path.into(),
            query: None,
            expected_status: 200,
            accept: join_accept(accept),
            content_type: None,
        }
    }

    /// POST expecting 200.
    pub fn post(
        name: impl Into<String>,
        path: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method: Method::POST,
            path: path.into(),
            query: None,
            expected_status: 200,
            accept: None,
            content_type: Some(content_type.into()),
        }
    }

    /// DELETE expecting 204.
    pub fn delete(name: impl Into<String>, path: impl Into<String>, accept: &[&str]) -> Self {
        Self {
            name: name.into(),
            method: Method::DELETE,
            path: path.into(),
            query: None,
            expected_status: 204,
            accept: join_accept(accept),
            content_type: None,
        }
    }

    /// Sets the raw query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Overrides the status code that counts as success.
    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Resolves the descriptor against a base URL.
    pub(crate) fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.join(&self.path).map_err(|err| {
            RestiveError::RequestFormat(format!("invalid path {:?}: {err}", self.path))
        })?;
        if let Some(query) = &self.query {
            url.set_query(Some(query));
        }
        Ok(url)
    }
}

fn join_accept(accept: &[&str]) -> Option<String> {
    if accept.is_empty() {
        None
    } else {
        Some(accept.join(", "))
    }
}
