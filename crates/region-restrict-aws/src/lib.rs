//! AWS collaborators for region-restrict
//!
//! Implements the `region-restrict` collaborator traits against live services:
//!
//! - **[`S3PolicyStore`]** → `GetBucketPolicy` / `PutBucketPolicy` / `DeleteBucketPolicy`
//! - **[`TaggingSearch`]** → Resource Groups Tagging `GetResources`
//! - **[`HttpRangeSource`]** → `GET ip-ranges.json`
//! - **[`CfnResponder`]** → `PUT` to the custom-resource `ResponseURL`
//!
//! ## Example
//!
//! ```no_run
//! use region_restrict::{InvocationContext, LifecycleDispatcher, RestrictConfig, TriggerEvent};
//! use region_restrict_aws::collaborators;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RestrictConfig::from_env()?;
//! let sdk_config = aws_config::load_from_env().await;
//! let http = reqwest::Client::builder().build()?;
//! let dispatcher = LifecycleDispatcher::new(config.clone(), collaborators(&sdk_config, &config, &http));
//!
//! let event = TriggerEvent::from_json(r#"{"Records": []}"#)?;
//! dispatcher.handle(&event, &InvocationContext::new("local")).await?;
//! # Ok(())
//! # }
//! ```

mod cfn;
mod ranges;
mod s3;
mod tagging;

pub use cfn::CfnResponder;
pub use ranges::HttpRangeSource;
pub use s3::{S3PolicyStore, NO_SUCH_BUCKET_POLICY};
pub use tagging::{TaggingSearch, S3_RESOURCE_TYPE};

use region_restrict::{Collaborators, RestrictConfig};
use std::sync::Arc;

/// Wire every collaborator to AWS using one shared SDK configuration
///
/// `http` carries both the range download and the custom-resource response.
pub fn collaborators(
    sdk_config: &aws_config::SdkConfig,
    config: &RestrictConfig,
    http: &reqwest::Client,
) -> Collaborators {
    Collaborators {
        store: Arc::new(S3PolicyStore::new(aws_sdk_s3::Client::new(sdk_config))),
        ranges: Arc::new(HttpRangeSource::new(http.clone(), &config.ip_ranges_url)),
        tags: Arc::new(TaggingSearch::new(
            aws_sdk_resourcegroupstagging::Client::new(sdk_config),
        )),
        callback: Arc::new(CfnResponder::new(http.clone())),
    }
}
