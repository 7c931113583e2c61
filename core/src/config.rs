//! Client configuration.
//!
//! # Design
//! `ClientConfig` is assembled once through `ClientConfigBuilder` and never
//! changes afterwards; the client shares it behind an `Arc` so concurrent
//! requests only ever read it. The base URL is validated in `build()` so a bad
//! address fails before any request can be issued.
//!
//! `ClientSettings` is the serializable subset (base URL, locale, timeout,
//! headers, messages) for loading from JSON or the environment.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::http::{Headers, Transport};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::locale::{ErrorMessages, Locale};
use crate::logger::Logger;
use crate::transport::ReqwestTransport;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

pub const ENV_BASE_URL: &str = "FETCH_BASE_URL";
pub const ENV_LOCALE: &str = "FETCH_LOCALE";
pub const ENV_TIMEOUT_MS: &str = "FETCH_TIMEOUT_MS";

/// Immutable configuration shared by every request of one client.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    headers: Headers,
    transport: Arc<dyn Transport>,
    locale: Locale,
    error_messages: ErrorMessages,
    timeout: Duration,
    request_interceptor: Option<Arc<dyn RequestInterceptor>>,
    response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Seed a builder from loaded settings.
    pub fn builder_from(settings: ClientSettings) -> ClientConfigBuilder {
        let mut builder = ClientConfigBuilder::new(settings.base_url)
            .locale(settings.locale)
            .timeout(Duration::from_millis(settings.timeout_ms));
        for (name, value) in settings.headers {
            builder = builder.header(name, value);
        }
        builder.error_messages(settings.error_messages)
    }

    /// Base URL, always ending with `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn error_messages(&self) -> &ErrorMessages {
        &self.error_messages
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn request_interceptor(&self) -> Option<&dyn RequestInterceptor> {
        self.request_interceptor.as_deref()
    }

    pub fn response_interceptor(&self) -> Option<&dyn ResponseInterceptor> {
        self.response_interceptor.as_deref()
    }

    pub fn logger(&self) -> Option<&dyn Logger> {
        self.logger.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("headers", &self.headers)
            .field("locale", &self.locale)
            .field("timeout", &self.timeout)
            .field("request_interceptor", &self.request_interceptor.is_some())
            .field("response_interceptor", &self.response_interceptor.is_some())
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[must_use = "ClientConfigBuilder does nothing until .build() is called"]
pub struct ClientConfigBuilder {
    base_url: String,
    headers: Headers,
    transport: Option<Arc<dyn Transport>>,
    locale: Locale,
    error_messages: ErrorMessages,
    timeout: Duration,
    request_interceptor: Option<Arc<dyn RequestInterceptor>>,
    response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Headers::new(),
            transport: None,
            locale: Locale::default(),
            error_messages: ErrorMessages::new(),
            timeout: DEFAULT_TIMEOUT,
            request_interceptor: None,
            response_interceptor: None,
            logger: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.merge(headers);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn error_message(
        mut self,
        locale: Locale,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        self.error_messages.insert(locale, status, message);
        self
    }

    pub fn error_messages(mut self, messages: ErrorMessages) -> Self {
        self.error_messages.extend(messages);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptor = Some(interceptor);
        self
    }

    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptor = Some(interceptor);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validate the base URL and freeze the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if the base URL is not an absolute http(s) URL,
    /// or if no transport was given and the default one cannot be created.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = normalize_base_url(&self.base_url)?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new().map_err(ConfigError::Transport)?),
        };
        Ok(ClientConfig {
            base_url,
            headers: self.headers,
            transport,
            locale: self.locale,
            error_messages: self.error_messages,
            timeout: self.timeout,
            request_interceptor: self.request_interceptor,
            response_interceptor: self.response_interceptor,
            logger: self.logger,
        })
    }
}

/// Parse `raw` as an absolute http(s) URL whose path ends with `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            url: raw.to_string(),
        });
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

/// Serializable client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub error_messages: ErrorMessages,
}

impl ClientSettings {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read `FETCH_BASE_URL`, `FETCH_LOCALE` and `FETCH_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingSetting(ENV_BASE_URL))?;
        let locale = match lookup(ENV_LOCALE) {
            Some(raw) => raw.parse()?,
            None => Locale::default(),
        };
        let timeout_ms = match lookup(ENV_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => default_timeout_ms(),
        };
        Ok(Self {
            base_url,
            locale,
            timeout_ms,
            headers: BTreeMap::new(),
            error_messages: ErrorMessages::new(),
        })
    }
}
