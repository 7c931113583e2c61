//! The request pipeline.
//!
//! # Design
//! `ApiClient` holds only an `Arc<ClientConfig>` and carries no mutable state
//! between calls. Each call walks the same steps: build the URL, headers and
//! body; run the request interceptor; race the transport against the timeout;
//! run the response interceptor; interpret the status and body. The building
//! steps are exposed as plain methods so they can be checked without I/O.
//!
//! There are no retries. A call yields exactly one outcome: a `Payload` or an
//! `Error`.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Error, TIMEOUT_STATUS};
use crate::http::{
    Headers, HttpMethod, HttpRequest, HttpResponse, PreparedBody, RequestBody, TransportError,
};
use crate::interceptor;
use crate::locale::{resolve_message, Locale};
use crate::query::{self, QueryOptions};

/// Per-call options. Owned by the caller and consumed by the call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub search_params: Option<Map<String, Value>>,
    pub query_options: QueryOptions,
    pub body: Option<RequestBody>,
    pub headers: Headers,
    /// Locale tried first when resolving an error message.
    pub locale: Option<Locale>,
    pub timeout: Option<Duration>,
    /// Caller's own cancellation token. The pipeline signal is derived from it.
    pub signal: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.search_params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn search_params(mut self, params: Map<String, Value>) -> Self {
        self.search_params = Some(params);
        self
    }

    pub fn query_options(mut self, options: QueryOptions) -> Self {
        self.query_options = options;
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let body = RequestBody::json(value).map_err(Error::Serialization)?;
        Ok(self.body(body))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Successful response content.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    /// 204, `Content-Length: 0` or an empty body.
    Empty,
}

impl Payload {
    /// Empty becomes `null`, text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
            Payload::Empty => Value::Null,
        }
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.into_value())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

/// Typed HTTP client over an injectable transport.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve `path` against the base URL and append serialized query
    /// parameters.
    ///
    /// Leading `/` characters are stripped so `path` never escapes the base
    /// prefix. The base URL's query, the path's own query and the serialized
    /// parameters are joined with `&`, in that order.
    pub fn build_url(
        &self,
        path: &str,
        search_params: Option<&Map<String, Value>>,
        query_options: &QueryOptions,
    ) -> Result<Url, Error> {
        let base = self.config.base_url();
        let relative = path.trim_start_matches('/');
        let mut url = base.join(relative).map_err(|e| Error::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        // Joining keeps the base query only for an empty path.
        let path_query = if relative.contains('?') { url.query() } else { None };
        let parts: Vec<String> = [base.query(), path_query]
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .chain(
                search_params
                    .map(|params| query::serialize(params, query_options))
                    .filter(|q| !q.is_empty()),
            )
            .collect();

        let joined = parts.join("&");
        url.set_query((!joined.is_empty()).then_some(joined.as_str()));
        Ok(url)
    }

    /// Default headers overlaid by per-call headers, plus a JSON content type
    /// for non-form bodies that do not declare one.
    pub fn build_headers(&self, options: &RequestOptions) -> Headers {
        let mut headers = self.config.headers().clone();
        headers.merge(&options.headers);
        if let Some(body) = &options.body {
            if !body.is_form() && !headers.contains("content-type") {
                headers.insert("Content-Type", "application/json");
            }
        }
        headers
    }

    /// Pass text, bytes and forms through; stringify JSON values.
    pub fn prepare_body(body: Option<&RequestBody>) -> Result<Option<PreparedBody>, Error> {
        let prepared = match body {
            None => None,
            Some(RequestBody::Text(text)) => Some(PreparedBody::Text(text.clone())),
            Some(RequestBody::Bytes(bytes)) => Some(PreparedBody::Bytes(bytes.clone())),
            Some(RequestBody::Form(form)) => Some(PreparedBody::Form(form.clone())),
            Some(RequestBody::Json(value)) => Some(PreparedBody::Text(
                serde_json::to_string(value).map_err(Error::Serialization)?,
            )),
        };
        Ok(prepared)
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, Error> {
        Ok(HttpRequest {
            method,
            url: self.build_url(path, options.search_params.as_ref(), &options.query_options)?,
            headers: self.build_headers(options),
            body: Self::prepare_body(options.body.as_ref())?,
        })
    }

    /// Run one request through the full pipeline.
    ///
    /// # Errors
    /// - `Error::Client` for non-2xx responses and timeouts (408).
    /// - `Error::Transport` for anything the transport rejects with.
    /// - `Error::InvalidPath`, `Error::Serialization`, `Error::Decode` for
    ///   local building and parsing failures.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<Payload, Error> {
        let outcome = self.run(method, path, &options).await;
        if let Err(e) = &outcome {
            self.log_error(
                "HTTP request failed",
                &json!({ "path": path, "method": method.as_str() }),
                e,
            );
        }
        outcome
    }

    async fn run(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Payload, Error> {
        let request = self.build_request(method, path, options)?;
        let request =
            interceptor::apply_request(self.config.request_interceptor(), request).await;
        let url = request.url.clone();

        self.log_debug(
            "HTTP request",
            &json!({
                "method": request.method.as_str(),
                "url": url.as_str(),
                "body": body_for_log(request.body.as_ref()),
            }),
        );

        let timeout = options.timeout.unwrap_or(self.config.timeout());
        let signal = match &options.signal {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let response = match self.dispatch(request, signal, timeout).await {
            Dispatch::Response(response) => response,
            Dispatch::Failed(e) => return Err(Error::Transport(e)),
            Dispatch::TimedOut => return Err(self.timeout_error(options.locale).into()),
        };

        let response =
            interceptor::apply_response(self.config.response_interceptor(), response).await;
        let status = response.status;
        let payload = self.interpret(response, options.locale)?;

        self.log_debug(
            "HTTP response",
            &json!({
                "status": status,
                "url": url.as_str(),
                "payload": payload.clone().into_value(),
            }),
        );
        Ok(payload)
    }

    /// Race the transport against the timeout. The loser is dropped; on
    /// timeout the signal handed to the transport is cancelled.
    async fn dispatch(
        &self,
        request: HttpRequest,
        signal: CancellationToken,
        timeout: Duration,
    ) -> Dispatch {
        let transport = self.config.transport();
        tokio::select! {
            biased;
            result = transport.send(request, signal.clone()) => match result {
                Ok(response) => Dispatch::Response(response),
                Err(e) => Dispatch::Failed(e),
            },
            () = tokio::time::sleep(timeout) => {
                signal.cancel();
                Dispatch::TimedOut
            }
        }
    }

    fn interpret(&self, response: HttpResponse, locale: Option<Locale>) -> Result<Payload, Error> {
        if !response.ok() {
            return Err(self.client_error(&response, locale).into());
        }
        if response.status == 204
            || response.header("content-length").map(str::trim) == Some("0")
            || response.body.is_empty()
        {
            return Ok(Payload::Empty);
        }
        if is_json(&response) {
            let value = response.json().map_err(Error::Decode)?;
            return Ok(Payload::Json(value));
        }
        Ok(Payload::Text(response.text()))
    }

    fn client_error(&self, response: &HttpResponse, locale: Option<Locale>) -> ClientError {
        let body = if response.body.is_empty() {
            None
        } else if is_json(response) {
            response.json::<Value>().ok()
        } else {
            Some(Value::String(response.text()))
        };
        ClientError {
            status: response.status,
            status_text: response.status_text.clone(),
            message: resolve_message(
                response.status,
                &response.status_text,
                locale,
                self.config.locale(),
                self.config.error_messages(),
            ),
            body,
            timeout: false,
        }
    }

    fn timeout_error(&self, locale: Option<Locale>) -> ClientError {
        ClientError::timed_out(resolve_message(
            TIMEOUT_STATUS,
            "Request Timeout",
            locale,
            self.config.locale(),
            self.config.error_messages(),
        ))
    }

    fn log_debug(&self, message: &str, context: &Value) {
        if let Some(logger) = self.config.logger() {
            let _ = logger.debug(message, context);
        }
    }

    fn log_error(&self, message: &str, context: &Value, error: &Error) {
        if let Some(logger) = self.config.logger() {
            let error: &(dyn std::error::Error + 'static) = error;
            let _ = logger.error(message, context, Some(error));
        }
    }

    /// `send` followed by deserialization into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.send(method, path, options)
            .await?
            .into_json()
            .map_err(Error::Decode)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(HttpMethod::Get, path, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(HttpMethod::Post, path, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(HttpMethod::Put, path, options).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(HttpMethod::Patch, path, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(HttpMethod::Delete, path, options).await
    }
}

enum Dispatch {
    Response(HttpResponse),
    Failed(TransportError),
    TimedOut,
}

fn is_json(response: &HttpResponse) -> bool {
    response
        .header("content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

fn body_for_log(body: Option<&PreparedBody>) -> Value {
    match body {
        None => Value::Null,
        Some(PreparedBody::Text(text)) => Value::String(text.clone()),
        Some(PreparedBody::Bytes(bytes)) => Value::String(format!("<{} bytes>", bytes.len())),
        Some(PreparedBody::Form(form)) => {
            Value::String(format!("<multipart form, {} parts>", form.parts().len()))
        }
    }
}
