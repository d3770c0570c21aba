//! Bucket policy storage
//!
//! The storage API replaces the whole policy document on every write, so the
//! unit of consistency is one bucket's document per run.

use crate::error::Result;
use crate::iam::PolicyDocument;
use async_trait::async_trait;
use tracing::{debug, info};

/// Access to bucket policies on the object store
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Fetch the raw policy JSON of `bucket`
    ///
    /// Returns `Ok(None)` only when the bucket has no policy attached
    /// (`NoSuchBucketPolicy`). Every other failure is an error.
    async fn get_policy(&self, bucket: &str) -> Result<Option<String>>;

    /// Replace the policy of `bucket` with `policy`
    async fn put_policy(&self, bucket: &str, policy: &str) -> Result<()>;

    /// Remove the policy of `bucket` entirely
    async fn delete_policy(&self, bucket: &str) -> Result<()>;
}

/// How a reconciled document was persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistAction {
    /// Document written with put-policy
    Put,
    /// Document had no statements left, policy deleted
    Delete,
}

/// Fetch the current policy of `bucket`, or an empty document if none exists
pub async fn fetch_policy<S>(store: &S, bucket: &str) -> Result<PolicyDocument>
where
    S: PolicyStore + ?Sized,
{
    match store.get_policy(bucket).await? {
        Some(json) => {
            debug!("Current policy for {}: {}", bucket, json);
            Ok(PolicyDocument::from_json(&json)?)
        }
        None => {
            debug!("No policy attached to {}, starting from empty document", bucket);
            Ok(PolicyDocument::new())
        }
    }
}

/// Write `document` back to `bucket`
///
/// A policy with zero statements is rejected by the storage API, so an empty
/// document deletes the policy instead of writing it.
pub async fn persist_policy<S>(
    store: &S,
    bucket: &str,
    document: &PolicyDocument,
) -> Result<PersistAction>
where
    S: PolicyStore + ?Sized,
{
    if document.is_empty() {
        store.delete_policy(bucket).await?;
        info!("Deleted empty policy from bucket {}", bucket);
        return Ok(PersistAction::Delete);
    }

    let json = document.to_json()?;
    store.put_policy(bucket, &json).await?;
    info!(
        "Put policy with {} statements on bucket {}",
        document.statement.len(),
        bucket
    );
    Ok(PersistAction::Put)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::iam::Statement;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Get(String),
        Put(String, String),
        Delete(String),
    }

    struct FakeStore {
        policy: std::result::Result<Option<String>, String>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeStore {
        fn with(policy: std::result::Result<Option<String>, String>) -> Self {
            FakeStore {
                policy,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PolicyStore for FakeStore {
        async fn get_policy(&self, bucket: &str) -> Result<Option<String>> {
            self.calls.lock().push(Call::Get(bucket.to_string()));
            self.policy
                .clone()
                .map_err(|code| Error::storage(bucket, "GetBucketPolicy", code))
        }

        async fn put_policy(&self, bucket: &str, policy: &str) -> Result<()> {
            self.calls
                .lock()
                .push(Call::Put(bucket.to_string(), policy.to_string()));
            Ok(())
        }

        async fn delete_policy(&self, bucket: &str) -> Result<()> {
            self.calls.lock().push(Call::Delete(bucket.to_string()));
            Ok(())
        }
    }

    fn canned_acl_policy() -> PolicyDocument {
        let mut doc = PolicyDocument::new();
        doc.add_statement(Statement::from_value(json!({
            "Sid": "AddCannedAcl",
            "Effect": "Allow",
            "Principal": {"AWS": ["arn:aws:iam::111122223333:root", "arn:aws:iam::444455556666:root"]},
            "Action": ["s3:PutObject", "s3:PutObjectAcl"],
            "Resource": "arn:aws:s3:::DOC-EXAMPLE-BUCKET/*",
            "Condition": {"StringEquals": {"s3:x-amz-acl": ["public-read"]}}
        })));
        doc
    }

    #[tokio::test]
    async fn test_fetch_existing_policy() {
        let policy = canned_acl_policy();
        let store = FakeStore::with(Ok(Some(policy.to_json().unwrap())));

        let fetched = fetch_policy(&store, "foobar").await.unwrap();

        assert_eq!(fetched, policy);
        assert_eq!(*store.calls.lock(), vec![Call::Get("foobar".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_missing_policy_is_empty_document() {
        let store = FakeStore::with(Ok(None));

        let fetched = fetch_policy(&store, "foobar").await.unwrap();

        assert_eq!(fetched, PolicyDocument::new());
    }

    #[tokio::test]
    async fn test_fetch_other_error_propagates() {
        let store = FakeStore::with(Err("AccessDenied".to_string()));

        let err = fetch_policy(&store, "foobar").await.unwrap_err();

        assert!(matches!(err, Error::Storage { .. }));
        assert!(err.to_string().contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_fetch_malformed_policy_is_json_error() {
        let store = FakeStore::with(Ok(Some("{not json".to_string())));

        let err = fetch_policy(&store, "foobar").await.unwrap_err();

        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_persist_non_empty_puts_exact_document() {
        let store = FakeStore::with(Ok(None));
        let policy = canned_acl_policy();

        let action = persist_policy(&store, "foobar", &policy).await.unwrap();

        assert_eq!(action, PersistAction::Put);
        assert_eq!(
            *store.calls.lock(),
            vec![Call::Put("foobar".to_string(), policy.to_json().unwrap())]
        );
    }

    #[tokio::test]
    async fn test_persist_empty_deletes_policy() {
        let store = FakeStore::with(Ok(None));

        let action = persist_policy(&store, "foobar", &PolicyDocument::new())
            .await
            .unwrap();

        assert_eq!(action, PersistAction::Delete);
        assert_eq!(*store.calls.lock(), vec![Call::Delete("foobar".to_string())]);
    }
}
