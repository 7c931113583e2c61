//! Default `Transport` backed by `reqwest`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use tokio_util::sync::CancellationToken;

use crate::http::{
    Cancelled, FormData, FormPart, Headers, HttpMethod, HttpRequest, HttpResponse,
    PreparedBody, Transport, TransportError,
};

/// Native transport: one `reqwest::Client`, no retries, no caching.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("fetch-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    fn to_multipart(form: FormData) -> Result<Form, TransportError> {
        let mut multipart = Form::new();
        for part in form.parts() {
            multipart = match part {
                FormPart::Text { name, value } => multipart.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    let mut file = Part::bytes(data.to_vec()).file_name(filename.clone());
                    if let Some(content_type) = content_type {
                        file = file.mime_str(content_type)?;
                    }
                    multipart.part(name.clone(), file)
                }
            };
        }
        Ok(multipart)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            None => builder,
            Some(PreparedBody::Text(text)) => builder.body(text),
            Some(PreparedBody::Bytes(bytes)) => builder.body(bytes),
            Some(PreparedBody::Form(form)) => builder.multipart(Self::to_multipart(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
        signal: CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        tokio::select! {
            biased;
            () = signal.cancelled() => Err(Box::new(Cancelled) as TransportError),
            result = self.execute(request) => result,
        }
    }
}
