//! # region-restrict - Region-Locked S3 Downloads
//!
//! `region-restrict` keeps a single deny statement inside an S3 bucket policy in
//! sync with the address ranges AWS publishes for one region, so objects can
//! only be downloaded from inside that region:
//!
//! - **Reconciliation** of the managed `DenyGetObjectForNonMatchingIp` statement,
//!   leaving every other statement untouched
//! - **Range resolution** from the published `ip-ranges.json` directory
//! - **Discovery** of managed buckets by tag when no bucket is named
//! - **Lifecycle dispatch** for CloudFormation custom-resource requests and
//!   `AmazonIpSpaceChanged` refresh notifications
//!
//! The crate talks to the outside world only through the [`PolicyStore`],
//! [`RangeSource`], [`TagSearch`] and [`LifecycleCallback`] traits. AWS-backed
//! implementations live in the `region-restrict-aws` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use region_restrict::{reconcile, PolicyDocument, Reconciliation, RestrictConfig, StatementSpec};
//!
//! # fn main() -> region_restrict::Result<()> {
//! let config = RestrictConfig::builder().region("us-east-1").build()?;
//! let spec = StatementSpec {
//!     statement_id: &config.statement_id,
//!     partition: &config.partition,
//! };
//!
//! let mut policy = PolicyDocument::new();
//! let prefixes = vec!["15.230.56.104/31".to_string(), "2600:1f19:8000::/36".to_string()];
//! reconcile(&mut policy, "my-bucket", &Reconciliation::Apply { prefixes: &prefixes }, spec)?;
//! assert_eq!(policy.statement.len(), 1);
//!
//! reconcile(&mut policy, "my-bucket", &Reconciliation::Remove, spec)?;
//! assert!(policy.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod iam;
pub mod lifecycle;
pub mod ranges;
pub mod store;
pub mod validation;

pub use crate::{
    config::{RestrictConfig, RestrictConfigBuilder},
    discovery::{TagPage, TagSearch, TargetDiscovery},
    error::{Error, Result},
    iam::{
        reconcile, ManagedStatement, PolicyDocument, ReconcileOutcome, Reconciliation, Statement,
        StatementSpec,
    },
    lifecycle::{
        with_lifecycle_reporting, CallbackResponse, CallbackStatus, Collaborators,
        DispatchReport, InvocationContext, LifecycleCallback, LifecycleDispatcher,
        LifecycleRequest, RefreshNotification, RequestKind, TargetReport, TriggerEvent,
    },
    ranges::{IpRangeDirectory, RangeResolver, RangeSource},
    store::{fetch_policy, persist_policy, PersistAction, PolicyStore},
    validation::RegionId,
};
