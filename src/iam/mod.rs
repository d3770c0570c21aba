//! Bucket policy handling
//!
//! Provides:
//! - JSON bucket policy documents with opaque pass-through statements
//! - The managed source-IP deny statement
//! - Reconciliation of the managed statement inside an existing policy

mod policy;
mod reconcile;
mod statement;

pub use policy::{PolicyDocument, Statement, POLICY_VERSION};
pub use reconcile::{reconcile, ReconcileOutcome, Reconciliation};
pub use statement::{Effect, IpCondition, ManagedStatement, SourceIp, SourceVpc, StatementSpec};
