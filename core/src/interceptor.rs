//! Request and response interceptors.
//!
//! # Design
//! A request interceptor sees the fully-built request (url, headers, body)
//! right before dispatch and may return a replacement. A response interceptor
//! sees the raw transport response before status and body interpretation.
//! An interceptor that fails leaves the value it was given untouched.

use async_trait::async_trait;

use crate::http::{BoxError, HttpRequest, HttpResponse};

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: HttpRequest) -> Result<HttpRequest, BoxError>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(&self, response: HttpResponse) -> Result<HttpResponse, BoxError>;
}

pub(crate) async fn apply_request(
    interceptor: Option<&dyn RequestInterceptor>,
    request: HttpRequest,
) -> HttpRequest {
    let Some(interceptor) = interceptor else {
        return request;
    };
    match interceptor.intercept(request.clone()).await {
        Ok(replaced) => replaced,
        Err(e) => {
            tracing::warn!(
                error = %e,
                url = %request.url,
                "request interceptor failed, sending original request"
            );
            request
        }
    }
}

pub(crate) async fn apply_response(
    interceptor: Option<&dyn ResponseInterceptor>,
    response: HttpResponse,
) -> HttpResponse {
    let Some(interceptor) = interceptor else {
        return response;
    };
    match interceptor.intercept(response.clone()).await {
        Ok(replaced) => replaced,
        Err(e) => {
            tracing::warn!(
                error = %e,
                status = response.status,
                "response interceptor failed, keeping original response"
            );
            response
        }
    }
}
