//! Tagged bucket search through the Resource Groups Tagging API

use async_trait::async_trait;
use aws_sdk_resourcegroupstagging::error::DisplayErrorContext;
use aws_sdk_resourcegroupstagging::types::TagFilter;
use aws_sdk_resourcegroupstagging::Client;
use region_restrict::{Error, Result, TagPage, TagSearch};

/// Resource type filter limiting the search to buckets
pub const S3_RESOURCE_TYPE: &str = "s3";

/// [`TagSearch`] backed by `GetResources`
#[derive(Clone, Debug)]
pub struct TaggingSearch {
    client: Client,
}

impl TaggingSearch {
    pub fn new(client: Client) -> Self {
        TaggingSearch { client }
    }
}

#[async_trait]
impl TagSearch for TaggingSearch {
    async fn search(&self, tag_key: &str, cursor: Option<&str>) -> Result<TagPage> {
        let output = self
            .client
            .get_resources()
            .tag_filters(TagFilter::builder().key(tag_key).build())
            .resource_type_filters(S3_RESOURCE_TYPE)
            .set_pagination_token(cursor.map(str::to_string))
            .send()
            .await
            .map_err(|e| Error::Discovery(DisplayErrorContext(&e).to_string()))?;

        Ok(TagPage {
            resource_arns: output
                .resource_tag_mapping_list()
                .iter()
                .filter_map(|mapping| mapping.resource_arn())
                .map(str::to_string)
                .collect(),
            next_cursor: output.pagination_token().map(str::to_string),
        })
    }
}
