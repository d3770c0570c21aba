//! Lifecycle outcome reporting
//!
//! A custom-resource request waits for exactly one SUCCESS or FAILED report
//! sent to its pre-signed response URL. Refresh notifications have nobody to
//! report to.

use super::event::{LifecycleRequest, TriggerEvent};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{debug, error, info};

/// Outcome reported to the provisioning system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    Success,
    Failed,
}

/// Runtime facts about the current invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Log stream holding this invocation's diagnostics
    pub log_stream_name: String,
}

impl InvocationContext {
    pub fn new(log_stream_name: impl Into<String>) -> Self {
        InvocationContext {
            log_stream_name: log_stream_name.into(),
        }
    }
}

/// Response document for a custom-resource request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: CallbackStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Value,
}

impl CallbackResponse {
    /// Build the response for `request`
    ///
    /// The physical id of an existing resource is echoed back unchanged; a
    /// changed id would make the provisioning system delete the old resource.
    pub fn new(
        request: &LifecycleRequest,
        context: &InvocationContext,
        status: CallbackStatus,
        data: &Value,
    ) -> Self {
        CallbackResponse {
            status,
            reason: format!(
                "See the details in CloudWatch Log Stream: {}",
                context.log_stream_name
            ),
            physical_resource_id: request
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| context.log_stream_name.clone()),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: data.clone(),
        }
    }
}

/// Delivers the outcome of a lifecycle request
#[async_trait]
pub trait LifecycleCallback: Send + Sync {
    async fn report(
        &self,
        request: &LifecycleRequest,
        context: &InvocationContext,
        status: CallbackStatus,
        data: &Value,
    ) -> Result<()>;
}

/// Callback payload: an empty object (the provisioning system rejects a null `Data`)
pub fn empty_response_data() -> Value {
    Value::Object(Map::new())
}

/// Run `operation` and report its outcome when the trigger was a lifecycle request
///
/// The operation always runs. A lifecycle request gets exactly one report,
/// SUCCESS or FAILED. Errors are logged, reported, then returned unchanged;
/// an error from the report itself takes the place of the original one.
pub async fn with_lifecycle_reporting<C, F, T>(
    event: &TriggerEvent,
    context: &InvocationContext,
    callback: &C,
    operation: F,
) -> Result<T>
where
    C: LifecycleCallback + ?Sized,
    F: Future<Output = Result<T>>,
{
    let result = operation.await;
    let data = empty_response_data();

    match (event, result) {
        (TriggerEvent::Lifecycle(request), Ok(value)) => {
            callback
                .report(request, context, CallbackStatus::Success, &data)
                .await?;
            info!("Reported SUCCESS for {:?} request", request.kind);
            Ok(value)
        }
        (TriggerEvent::Lifecycle(request), Err(err)) => {
            error!("{:?} request failed: {}", request.kind, err);
            callback
                .report(request, context, CallbackStatus::Failed, &data)
                .await?;
            info!("Reported FAILED for {:?} request", request.kind);
            Err(err)
        }
        (TriggerEvent::Refresh(_), Ok(value)) => {
            debug!("Refresh notification completed, no lifecycle callback to send");
            Ok(value)
        }
        (TriggerEvent::Refresh(_), Err(err)) => {
            error!("Refresh notification failed: {}", err);
            Err(err)
        }
    }
}
