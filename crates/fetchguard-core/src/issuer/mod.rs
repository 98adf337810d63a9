//! Request-issuing primitives.
//!
//! The engine does not speak HTTP itself. It drives an `Issuer`, which turns
//! a `Request` into a `Response` (or a tagged `Failure`) and stops early when
//! its `AbortSignal` is raised. `CurlIssuer` is the libcurl-backed default.

mod global;
mod libcurl;

use async_trait::async_trait;

use crate::control::AbortSignal;
use crate::retry::{Failure, RequestOptions};

pub use global::{default_issuer, installed_count, set_default_issuer, GuardedIssuer};
pub(crate) use global::{guard_default, restore_default, Interception};
pub use libcurl::CurlIssuer;

/// Anything with a status and a success predicate.
pub trait ResponseLike {
    fn status(&self) -> u16;

    /// Reason phrase or other short text describing the status.
    fn reason(&self) -> String {
        String::new()
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub options: RequestOptions,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: Vec::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl ResponseLike for Response {
    fn status(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> String {
        self.reason.clone()
    }
}

/// Issues one attempt of a request.
#[async_trait]
pub trait Issuer: Send + Sync {
    async fn issue(&self, request: &Request, abort: AbortSignal) -> Result<Response, Failure>;

    /// True for issuers that already route through a retrying executor.
    fn is_guarded(&self) -> bool {
        false
    }
}
