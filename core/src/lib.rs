//! Typed HTTP request pipeline over an injectable transport.
//!
//! # Overview
//! `ApiClient` turns a logical request (path, query parameters, body,
//! headers, locale, timeout) into an `HttpRequest`, dispatches it through a
//! `Transport` raced against a timeout, and maps the result to a `Payload` or
//! an `Error`. Non-2xx responses become `ClientError` values carrying a
//! localized message.
//!
//! # Design
//! - `ClientConfig` is immutable once built and shared read-only.
//! - The transport is a trait object; `ReqwestTransport` is the default and
//!   tests inject scripted ones.
//! - One attempt per call. Timeouts cancel the transport's signal and surface
//!   as a 408 `ClientError`; other transport failures pass through unchanged.
//! - Interceptors and the logger are optional side channels whose failures
//!   never change the outcome.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod locale;
pub mod logger;
pub mod query;
pub mod transport;

pub use client::{ApiClient, Payload, RequestOptions};
pub use config::{ClientConfig, ClientConfigBuilder, ClientSettings};
pub use error::{ClientError, ConfigError, Error};
pub use http::{
    BoxError, Cancelled, FormData, FormPart, Headers, HttpMethod, HttpRequest, HttpResponse,
    PreparedBody, RequestBody, Transport, TransportError,
};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use locale::{ErrorMessages, Locale};
pub use logger::{Logger, TracingLogger};
pub use query::{ArrayFormat, QueryOptions};
pub use transport::ReqwestTransport;
