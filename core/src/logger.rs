//! Logger handle consumed by the pipeline.
//!
//! The pipeline emits one entry before dispatch and one after the outcome is
//! known. Failures returned by a `Logger` are ignored.

use serde_json::Value;

use crate::http::BoxError;

pub trait Logger: Send + Sync {
    fn debug(&self, message: &str, context: &Value) -> Result<(), BoxError>;

    fn error(
        &self,
        message: &str,
        context: &Value,
        error: Option<&(dyn std::error::Error + 'static)>,
    ) -> Result<(), BoxError>;
}

/// Forwards entries to `tracing` under the `fetch_core` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, context: &Value) -> Result<(), BoxError> {
        tracing::debug!(target: "fetch_core", context = %context, "{message}");
        Ok(())
    }

    fn error(
        &self,
        message: &str,
        context: &Value,
        error: Option<&(dyn std::error::Error + 'static)>,
    ) -> Result<(), BoxError> {
        match error {
            Some(error) => tracing::error!(
                target: "fetch_core",
                context = %context,
                error = %error,
                "{message}"
            ),
            None => tracing::error!(target: "fetch_core", context = %context, "{message}"),
        }
        Ok(())
    }
}
