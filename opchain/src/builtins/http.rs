//! The HTTP request side effect.
//!
//! The operation is always registered. Without the `http` feature it fails
//! at run time, which its `on_error` policy then handles like any other
//! failure.

use crate::context::PipelineContext;
use crate::core::{ConfigSchema, ParamSpec, ParamType};
use crate::errors::Result;
use crate::operations::{OperationCall, OperationDescriptor, SideEffect};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Sends an HTTP request built from templates over the value and shared data.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRequest;

impl OperationDescriptor for HttpRequest {
    fn description(&self) -> &str {
        "Make an HTTP request, optionally storing the response in the shared data"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required(
                "url",
                ParamSpec::new(ParamType::Str, "URL (can use {value} placeholder)")
                    .with_example(json!("https://api.example.com/items/{value}")),
            )
            .optional(
                "method",
                ParamSpec::new(ParamType::Str, "HTTP method: GET, POST, PUT, or DELETE")
                    .with_default(json!("GET")),
            )
            .optional(
                "headers",
                ParamSpec::new(ParamType::Dict, "Dict of HTTP headers")
                    .with_example(json!({"Authorization": "Bearer token"})),
            )
            .optional(
                "body_template",
                ParamSpec::new(ParamType::Str, "Body template (for POST/PUT)")
                    .with_example(json!(r#"{{"id": "{value}"}}"#)),
            )
            .optional(
                "store_response_key",
                ParamSpec::new(ParamType::Str, "Store response in context under this key")
                    .with_example(json!("api_response")),
            )
            .optional(
                "timeout",
                ParamSpec::new(ParamType::Int, "Request timeout in seconds")
                    .with_default(json!(30)),
            )
    }
}

#[async_trait]
impl SideEffect for HttpRequest {
    async fn perform(
        &self,
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()> {
        client::send(call, value, ctx).await
    }
}

#[cfg(feature = "http")]
mod client {
    use super::DEFAULT_TIMEOUT_SECS;
    use crate::builtins::template::{display_value, render, value_args};
    use crate::context::PipelineContext;
    use crate::errors::{OperationError, Result};
    use crate::operations::OperationCall;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tracing::{error, info};

    pub(super) async fn send(
        call: OperationCall<'_>,
        value: &Value,
        ctx: &PipelineContext,
    ) -> Result<()> {
        let method_name = call.config.str_or("method", "GET").to_uppercase();
        let method =
            reqwest::Method::from_bytes(method_name.as_bytes()).map_err(OperationError::other)?;

        let args = ctx.shared_data().with(|shared| value_args(value, shared));
        let url = render(call.config.str_or("url", ""), &args).map_err(OperationError::other)?;

        let timeout = call
            .config
            .get_f64("timeout")
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OperationError::other)?;

        let mut request = client.request(method, &url);
        if let Some(headers) = call.config.get_object("headers") {
            for (name, header) in headers {
                request = request.header(name.as_str(), display_value(header));
            }
        }
        if matches!(method_name.as_str(), "POST" | "PUT") {
            if let Some(body_template) = call.config.get_str("body_template") {
                request = request.body(render(body_template, &args).map_err(OperationError::other)?);
            }
        }

        let response = request.send().await.map_err(|err| {
            error!(operation = call.name, url = %url, error = %err, "HTTP request failed");
            OperationError::other(err)
        })?;
        let status = response.status().as_u16();
        let data = response.text().await.map_err(OperationError::other)?;
        info!(operation = call.name, "{method_name} {url} -> {status}");

        if let Some(key) = call.config.get_str("store_response_key") {
            ctx.shared_data()
                .set(key, json!({"status": status, "data": data}));
        }
        Ok(())
    }
}

#[cfg(not(feature = "http"))]
mod client {
    use crate::context::PipelineContext;
    use crate::errors::{OperationError, Result};
    use crate::operations::OperationCall;
    use serde_json::Value;

    #[allow(clippy::unused_async)]
    pub(super) async fn send(
        call: OperationCall<'_>,
        _value: &Value,
        _ctx: &PipelineContext,
    ) -> Result<()> {
        Err(OperationError::other(format!(
            "{} requires the `http` feature of opchain",
            call.name
        )))
    }
}
