//! HTTP transport types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds an
//! `HttpRequest`, hands it to a `Transport` together with a cancellation
//! signal, and interprets the returned `HttpResponse`. Any fetch-like
//! implementation can sit behind the trait; tests inject a scripted one and
//! production code uses `ReqwestTransport`.
//!
//! All fields use owned types so values can move freely through interceptors
//! and across task boundaries.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Boxed error returned by transports, interceptors and loggers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error produced by a `Transport`. Passed through the pipeline unchanged.
pub type TransportError = BoxError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive lookup.
///
/// Names keep the casing of their most recent write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name` to `value`, replacing any existing entry that matches
    /// case-insensitively.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Overlay `other` on top of `self`; `other` wins on key collisions.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A single multipart part.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Multipart form payload. The transport picks the boundary and sets the
/// matching `Content-Type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            filename: filename.into(),
            content_type,
            data: data.into(),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

/// Caller-supplied request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Bytes(Bytes),
    Form(FormData),
    /// Serialized to a JSON string before dispatch.
    Json(serde_json::Value),
}

impl RequestBody {
    /// Serialize any `Serialize` value into a `Json` body.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(RequestBody::Json)
    }

    pub fn is_form(&self) -> bool {
        matches!(self, RequestBody::Form(_))
    }
}

/// Body as it goes out on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Text(String),
    Bytes(Bytes),
    Form(FormData),
}

impl PreparedBody {
    /// Body as text, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PreparedBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A fully-formed outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<PreparedBody>,
}

/// A transport response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl HttpResponse {
    /// Response with the canonical reason phrase for `status` and no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Reason phrase for well-known status codes, empty otherwise.
pub fn canonical_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

/// Returned by transports that stop because their signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Executes one HTTP round-trip.
///
/// Implementations must resolve with `Err` soon after `signal` fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: HttpRequest,
        signal: CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}
