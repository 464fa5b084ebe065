//! AWS Lambda invoker.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_lambda::config::retry::RetryConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::Client as LambdaClient;
use bytes::Bytes;

use crate::config::FunctionConfig;
use crate::invoke::{InvokeError, Invoker};

/// Synchronous (`RequestResponse`) invocations through the Lambda API.
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: LambdaClient,
    timeout: Duration,
}

impl LambdaInvoker {
    pub fn new(client: LambdaClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Build a client from a function's region, credentials and endpoint.
    ///
    /// Unset fields fall back to the default AWS provider chain. SDK retries
    /// are disabled: the request is attempted once.
    pub async fn from_config(function: &FunctionConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &function.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let (Some(access_key), Some(secret_key)) = (&function.access_key, &function.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "alb-lambda-proxy-config",
            ));
        }
        let sdk_config = loader.load().await;

        let mut lambda_config = aws_sdk_lambda::config::Builder::from(&sdk_config)
            .retry_config(RetryConfig::standard().with_max_attempts(1));
        if let Some(url) = &function.endpoint_url {
            lambda_config = lambda_config.endpoint_url(url);
        }

        tracing::debug!(
            function = %function.name,
            region = ?sdk_config.region(),
            endpoint = ?function.endpoint_url,
            "Lambda client configured"
        );

        Self::new(
            LambdaClient::from_conf(lambda_config.build()),
            Duration::from_secs(function.timeout_secs),
        )
    }
}

#[async_trait]
impl Invoker for LambdaInvoker {
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, InvokeError> {
        let request = self
            .client
            .invoke()
            .function_name(function)
            .payload(Blob::new(payload.to_vec()))
            .send();

        let output = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| InvokeError::Timeout(self.timeout))?
            .map_err(|err| InvokeError::Request(DisplayErrorContext(&err).to_string()))?;

        let body = output
            .payload()
            .map(|blob| Bytes::copy_from_slice(blob.as_ref()))
            .unwrap_or_default();

        if let Some(kind) = output.function_error() {
            return Err(InvokeError::Function {
                kind: kind.to_string(),
                payload: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}
