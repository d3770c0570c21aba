//! Tag-based discovery of managed buckets

use crate::error::{Error, Result};
use crate::validation::bucket_from_arn;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// One page of a tag search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPage {
    /// ARNs of resources carrying the tag
    pub resource_arns: Vec<String>,
    /// Cursor for the next page; empty or absent on the last page
    pub next_cursor: Option<String>,
}

/// Paginated search for resources carrying a tag
#[async_trait]
pub trait TagSearch: Send + Sync {
    /// Fetch the page after `cursor` (first page when `None`)
    async fn search(&self, tag_key: &str, cursor: Option<&str>) -> Result<TagPage>;
}

/// Collects every bucket carrying the management marker tag
pub struct TargetDiscovery<'a, T: TagSearch + ?Sized> {
    search: &'a T,
    tag_key: &'a str,
}

impl<'a, T: TagSearch + ?Sized> TargetDiscovery<'a, T> {
    pub fn new(search: &'a T, tag_key: &'a str) -> Self {
        TargetDiscovery { search, tag_key }
    }

    /// Follow pagination until the cursor runs out and return all bucket names
    ///
    /// All-or-nothing: a failed page discards everything collected so far.
    /// Tagged resources that are not buckets are skipped.
    pub async fn discover_all(&self) -> Result<Vec<String>> {
        let mut buckets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .search
                .search(self.tag_key, cursor.as_deref())
                .await
                .map_err(|e| match e {
                    Error::Discovery(_) => e,
                    other => Error::Discovery(other.to_string()),
                })?;
            pages += 1;

            // Access points and other S3 resources can carry the tag too
            for arn in &page.resource_arns {
                match bucket_from_arn(arn) {
                    Ok(bucket) => buckets.push(bucket.to_string()),
                    Err(_) => warn!("Skipping tagged resource {}: not a bucket", arn),
                }
            }

            debug!(
                "Tag search page {} returned {} resources",
                pages,
                page.resource_arns.len()
            );

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        info!(
            "Discovered {} buckets tagged {} across {} pages",
            buckets.len(),
            self.tag_key,
            pages
        );
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct PagedSearch {
        pages: Mutex<VecDeque<Result<TagPage>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl PagedSearch {
        fn new(pages: Vec<Result<TagPage>>) -> Self {
            PagedSearch {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TagSearch for PagedSearch {
        async fn search(&self, tag_key: &str, cursor: Option<&str>) -> Result<TagPage> {
            assert_eq!(tag_key, "single-region-access");
            self.cursors.lock().push(cursor.map(str::to_string));
            self.pages
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Discovery("no more pages".to_string())))
        }
    }

    fn page(arns: &[&str], cursor: Option<&str>) -> Result<TagPage> {
        Ok(TagPage {
            resource_arns: arns.iter().map(|a| a.to_string()).collect(),
            next_cursor: cursor.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_follows_pagination_until_empty_cursor() {
        let search = PagedSearch::new(vec![
            page(&["arn:aws:s3:::first-bucket"], Some("paginatiotoken1")),
            page(&["arn:aws:s3:::second-bucket"], Some("paginationtoken2")),
            page(&[], Some("")),
        ]);

        let buckets = TargetDiscovery::new(&search, "single-region-access")
            .discover_all()
            .await
            .unwrap();

        assert_eq!(buckets, vec!["first-bucket", "second-bucket"]);
        assert_eq!(
            *search.cursors.lock(),
            vec![
                None,
                Some("paginatiotoken1".to_string()),
                Some("paginationtoken2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_absent_cursor_ends_pagination() {
        let search = PagedSearch::new(vec![page(
            &["arn:aws:s3:::a-bucket", "arn:aws:s3:::b-bucket"],
            None,
        )]);

        let buckets = TargetDiscovery::new(&search, "single-region-access")
            .discover_all()
            .await
            .unwrap();

        assert_eq!(buckets, vec!["a-bucket", "b-bucket"]);
        assert_eq!(search.cursors.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_discards_partial_results() {
        let search = PagedSearch::new(vec![
            page(&["arn:aws:s3:::first-bucket"], Some("token")),
            Err(Error::Storage {
                bucket: String::new(),
                operation: "GetResources",
                message: "throttled".to_string(),
            }),
        ]);

        let err = TargetDiscovery::new(&search, "single-region-access")
            .discover_all()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Discovery(msg) if msg.contains("throttled")));
    }

    #[tokio::test]
    async fn test_non_bucket_arns_are_skipped() {
        let search = PagedSearch::new(vec![page(
            &[
                "arn:aws:s3:us-east-1:123456789012:accesspoint/restricted-ap",
                "arn:aws:s3:::kept-bucket",
                "arn:aws:sqs:us-east-1:123456789012:queue",
            ],
            None,
        )]);

        let buckets = TargetDiscovery::new(&search, "single-region-access")
            .discover_all()
            .await
            .unwrap();

        assert_eq!(buckets, vec!["kept-bucket"]);
    }
}
