//! Managed statement reconciliation
//!
//! Strips every previous copy of the managed statement, then (unless the
//! bucket is being released) appends a freshly built one. Other statements are
//! never touched and keep their relative order.

use super::policy::PolicyDocument;
use super::statement::{ManagedStatement, StatementSpec};
use crate::error::Result;
use tracing::debug;

/// What to do with the managed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation<'a> {
    /// Replace the managed statement with one allowing `prefixes`
    Apply { prefixes: &'a [String] },
    /// Remove the managed statement (bucket is being decommissioned)
    Remove,
}

/// Result of a single reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Stale managed statements removed
    pub removed: usize,
    /// Whether a fresh managed statement was appended
    pub appended: bool,
}

/// Reconcile the managed statement of `document` in place
///
/// After this call the document holds zero (`Remove`) or exactly one (`Apply`)
/// statement with the managed Sid. Applying the same prefixes twice yields
/// the same document as applying them once.
pub fn reconcile(
    document: &mut PolicyDocument,
    bucket: &str,
    reconciliation: &Reconciliation<'_>,
    spec: StatementSpec<'_>,
) -> Result<ReconcileOutcome> {
    let removed = document.remove_statements(spec.statement_id);
    if removed > 1 {
        debug!(
            "Removed {} duplicate managed statements from {}",
            removed, bucket
        );
    }

    let appended = match reconciliation {
        Reconciliation::Remove => false,
        Reconciliation::Apply { prefixes } => {
            let statement = ManagedStatement::build(spec, bucket, prefixes).into_statement()?;
            document.add_statement(statement);
            true
        }
    };

    debug!(
        "Reconciled policy for {}: removed={}, appended={}, statements={}",
        bucket,
        removed,
        appended,
        document.statement.len()
    );

    Ok(ReconcileOutcome { removed, appended })
}
