//! Lifecycle dispatch
//!
//! Turns a decoded trigger into per-bucket fetch → reconcile → persist runs:
//!
//! - **Create / Update**: one bucket, prefixes resolved, managed statement applied
//! - **Delete**: one bucket, no prefix lookup, managed statement removed
//! - **Refresh**: the fixed bucket or every tagged bucket, prefixes resolved once
//!
//! Buckets are processed one after another and the first failure aborts the
//! remaining ones. Buckets already written stay written.

use super::callback::{with_lifecycle_reporting, InvocationContext, LifecycleCallback};
use super::event::{LifecycleRequest, RequestKind, TriggerEvent};
use crate::config::RestrictConfig;
use crate::discovery::{TagSearch, TargetDiscovery};
use crate::error::{Error, Result};
use crate::iam::{reconcile, Reconciliation, StatementSpec};
use crate::ranges::{RangeResolver, RangeSource};
use crate::store::{fetch_policy, persist_policy, PersistAction, PolicyStore};
use std::sync::Arc;
use tracing::info;

/// Error message for a lifecycle request with no bucket to act on
pub const MISSING_BUCKET_NAME: &str = "BucketName parameter is required";

/// External systems the dispatcher talks to
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn PolicyStore>,
    pub ranges: Arc<dyn RangeSource>,
    pub tags: Arc<dyn TagSearch>,
    pub callback: Arc<dyn LifecycleCallback>,
}

/// Outcome for one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub bucket: String,
    /// Stale managed statements removed
    pub removed: usize,
    /// Whether a fresh managed statement was written
    pub appended: bool,
    pub action: PersistAction,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub targets: Vec<TargetReport>,
}

/// Drives a run from trigger to persisted policies
pub struct LifecycleDispatcher {
    config: RestrictConfig,
    collaborators: Collaborators,
}

impl LifecycleDispatcher {
    pub fn new(config: RestrictConfig, collaborators: Collaborators) -> Self {
        LifecycleDispatcher {
            config,
            collaborators,
        }
    }

    /// Handle `event`, reporting the outcome when it is a lifecycle request
    ///
    /// Errors are always returned to the caller, also after a FAILED report.
    pub async fn handle(
        &self,
        event: &TriggerEvent,
        context: &InvocationContext,
    ) -> Result<DispatchReport> {
        with_lifecycle_reporting(
            event,
            context,
            self.collaborators.callback.as_ref(),
            self.dispatch(event),
        )
        .await
    }

    /// Handle `event` without any outcome reporting
    pub async fn dispatch(&self, event: &TriggerEvent) -> Result<DispatchReport> {
        match event {
            TriggerEvent::Lifecycle(request) => self.dispatch_lifecycle(request).await,
            TriggerEvent::Refresh(notification) => {
                info!(
                    "Refresh notification received (subjects: {:?})",
                    notification.subjects
                );
                self.dispatch_refresh().await
            }
        }
    }

    async fn dispatch_lifecycle(&self, request: &LifecycleRequest) -> Result<DispatchReport> {
        let bucket = self.lifecycle_target(request)?;
        info!("{:?} request for bucket {}", request.kind, bucket);

        let report = match request.kind {
            RequestKind::Create | RequestKind::Update => {
                let region = self.config.require_region()?;
                let prefixes = self.resolver().resolve(&region).await?;
                self.restrict_bucket(&bucket, &Reconciliation::Apply { prefixes: &prefixes })
                    .await?
            }
            RequestKind::Delete => {
                self.restrict_bucket(&bucket, &Reconciliation::Remove)
                    .await?
            }
        };

        Ok(DispatchReport {
            targets: vec![report],
        })
    }

    async fn dispatch_refresh(&self) -> Result<DispatchReport> {
        let region = self.config.require_region()?;

        let buckets = match self.config.fixed_bucket() {
            Some(bucket) => vec![bucket.to_string()],
            None => {
                TargetDiscovery::new(self.collaborators.tags.as_ref(), &self.config.tag_key)
                    .discover_all()
                    .await?
            }
        };

        if buckets.is_empty() {
            info!("No buckets tagged {}, nothing to refresh", self.config.tag_key);
            return Ok(DispatchReport::default());
        }

        let prefixes = self.resolver().resolve(&region).await?;
        let apply = Reconciliation::Apply {
            prefixes: &prefixes,
        };

        let mut report = DispatchReport::default();
        for bucket in &buckets {
            report.targets.push(self.restrict_bucket(bucket, &apply).await?);
        }

        info!("Refreshed {} buckets for {}", report.targets.len(), region);
        Ok(report)
    }

    /// Bucket named by the request, else the fixed bucket from configuration
    fn lifecycle_target(&self, request: &LifecycleRequest) -> Result<String> {
        request
            .target()
            .or_else(|| self.config.fixed_bucket())
            .map(str::to_string)
            .ok_or_else(|| Error::Configuration(MISSING_BUCKET_NAME.to_string()))
    }

    fn resolver(&self) -> RangeResolver<'_, dyn RangeSource> {
        RangeResolver::new(self.collaborators.ranges.as_ref(), &self.config.service)
    }

    fn statement_spec(&self) -> StatementSpec<'_> {
        StatementSpec {
            statement_id: &self.config.statement_id,
            partition: &self.config.partition,
        }
    }

    /// Fetch, reconcile and persist the policy of one bucket
    async fn restrict_bucket(
        &self,
        bucket: &str,
        reconciliation: &Reconciliation<'_>,
    ) -> Result<TargetReport> {
        let store = self.collaborators.store.as_ref();

        let mut document = fetch_policy(store, bucket).await?;
        let outcome = reconcile(&mut document, bucket, reconciliation, self.statement_spec())?;
        let action = persist_policy(store, bucket, &document).await?;

        Ok(TargetReport {
            bucket: bucket.to_string(),
            removed: outcome.removed,
            appended: outcome.appended,
            action,
        })
    }
}
