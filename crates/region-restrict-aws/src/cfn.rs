//! CloudFormation custom-resource responses

use async_trait::async_trait;
use region_restrict::{
    CallbackResponse, CallbackStatus, Error, InvocationContext, LifecycleCallback,
    LifecycleRequest, Result,
};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info};

/// [`LifecycleCallback`] that PUTs the response document to the pre-signed `ResponseURL`
#[derive(Clone, Debug)]
pub struct CfnResponder {
    client: reqwest::Client,
}

impl CfnResponder {
    pub fn new(client: reqwest::Client) -> Self {
        CfnResponder { client }
    }
}

#[async_trait]
impl LifecycleCallback for CfnResponder {
    async fn report(
        &self,
        request: &LifecycleRequest,
        context: &InvocationContext,
        status: CallbackStatus,
        data: &Value,
    ) -> Result<()> {
        if request.response_url.is_empty() {
            return Err(Error::Callback("request has no ResponseURL".to_string()));
        }

        let body = serde_json::to_string(&CallbackResponse::new(request, context, status, data))?;
        debug!("Response body: {}", body);

        // The URL is pre-signed without a content type
        let response = self
            .client
            .put(&request.response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Callback(e.to_string()))?;

        info!("Response delivered, status code: {}", response.status());
        Ok(())
    }
}
