//! Trigger event decoding
//!
//! A document carrying `RequestType` is a CloudFormation custom-resource
//! request; anything else is a refresh notification (the SNS
//! `AmazonIpSpaceChanged` message). The distinction is made once, here.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Custom-resource request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

/// An explicit provisioning request for one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRequest {
    #[serde(rename = "RequestType")]
    pub kind: RequestKind,

    /// Pre-signed location the outcome is reported to
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,

    #[serde(default)]
    pub stack_id: String,

    #[serde(default)]
    pub request_id: String,

    #[serde(default)]
    pub logical_resource_id: String,

    /// Absent on Create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default)]
    pub resource_properties: Map<String, Value>,
}

impl LifecycleRequest {
    /// Bucket named by the request's `BucketName` property
    pub fn target(&self) -> Option<&str> {
        self.resource_properties
            .get("BucketName")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }
}

/// A "re-synchronize everything" notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshNotification {
    /// SNS subjects carried by the notification, for logging only
    pub subjects: Vec<String>,
}

/// What triggered this run
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Lifecycle(LifecycleRequest),
    Refresh(RefreshNotification),
}

impl TriggerEvent {
    /// Decode a raw event document
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Event("event must be a JSON object".to_string()));
        }

        if value.get("RequestType").is_some() {
            let request: LifecycleRequest = serde_json::from_value(value)
                .map_err(|e| Error::Event(format!("invalid custom resource request: {}", e)))?;
            return Ok(TriggerEvent::Lifecycle(request));
        }

        let subjects: Vec<String> = value
            .get("Records")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.pointer("/Sns/Subject").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(TriggerEvent::Refresh(RefreshNotification { subjects }))
    }

    /// Decode an event from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::Event(format!("event is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// The lifecycle request, if this run was triggered by one
    pub fn lifecycle_request(&self) -> Option<&LifecycleRequest> {
        match self {
            TriggerEvent::Lifecycle(request) => Some(request),
            TriggerEvent::Refresh(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_create_request() {
        let event = TriggerEvent::from_value(json!({
            "RequestType": "Create",
            "ResponseURL": "pre-signed-url-for-create-response",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/restrict/guid",
            "RequestId": "unique-id",
            "ResourceType": "Custom::RegionRestriction",
            "LogicalResourceId": "RestrictRegion",
            "ResourceProperties": {"ServiceToken": "arn:aws:lambda:...", "BucketName": "foobar"}
        }))
        .unwrap();

        let request = event.lifecycle_request().unwrap();
        assert_eq!(request.kind, RequestKind::Create);
        assert_eq!(request.response_url, "pre-signed-url-for-create-response");
        assert_eq!(request.target(), Some("foobar"));
        assert!(request.physical_resource_id.is_none());
    }

    #[test]
    fn test_decode_request_without_bucket_name() {
        for properties in [json!({}), json!({"KetbuckName": "foobar"}), json!({"BucketName": ""})] {
            let event = TriggerEvent::from_value(json!({
                "RequestType": "Delete",
                "ResourceProperties": properties
            }))
            .unwrap();
            assert_eq!(event.lifecycle_request().unwrap().target(), None);
        }

        let event = TriggerEvent::from_value(json!({"RequestType": "Update"})).unwrap();
        assert_eq!(event.lifecycle_request().unwrap().target(), None);
    }

    #[test]
    fn test_decode_unknown_request_type_fails() {
        let err = TriggerEvent::from_value(json!({"RequestType": "Rollback"})).unwrap_err();
        assert!(matches!(err, Error::Event(_)));
    }

    #[test]
    fn test_decode_sns_notification() {
        let event = TriggerEvent::from_value(json!({
            "Records": [{
                "EventVersion": "1.0",
                "EventSubscriptionArn": "arn:aws:sns:us-east-1:806199016981:AmazonIpSpaceChanged:guid",
                "EventSource": "aws:sns",
                "Sns": {"Subject": "[AmazonIpSpaceChanged] New ip-ranges.json available", "Message": "{}"}
            }]
        }))
        .unwrap();

        assert_eq!(
            event,
            TriggerEvent::Refresh(RefreshNotification {
                subjects: vec!["[AmazonIpSpaceChanged] New ip-ranges.json available".to_string()]
            })
        );
        assert!(event.lifecycle_request().is_none());
    }

    #[test]
    fn test_decode_empty_object_is_refresh() {
        let event = TriggerEvent::from_json("{}").unwrap();
        assert_eq!(event, TriggerEvent::Refresh(RefreshNotification::default()));
    }

    #[test]
    fn test_decode_non_object_fails() {
        assert!(matches!(TriggerEvent::from_json("[1]"), Err(Error::Event(_))));
        assert!(matches!(TriggerEvent::from_json("not json"), Err(Error::Event(_))));
    }
}
