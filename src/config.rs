//! Run configuration
//!
//! Built once at process start and passed by reference into every component.
//! Values come from the environment, a TOML file or the builder; command line
//! flags in the binary override both.

use crate::error::{Error, Result};
use crate::validation::{validate_tag_key, RegionId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identifier of the statement this crate owns inside a bucket policy
pub const DEFAULT_STATEMENT_ID: &str = "DenyGetObjectForNonMatchingIp";

/// Tag that marks buckets under management
pub const DEFAULT_TAG_KEY: &str = "single-region-access";

/// Service name S3 publishes its ranges under in `ip-ranges.json`
pub const DEFAULT_SERVICE: &str = "AMAZON";

/// ARN partition used for the statement resource
pub const DEFAULT_PARTITION: &str = "aws";

/// Published AWS address-range directory
pub const DEFAULT_IP_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Configuration for a restriction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestrictConfig {
    /// Region whose address ranges are allowed
    pub region: Option<String>,

    /// Fixed target bucket (single-bucket deployments)
    ///
    /// When unset, refresh notifications discover buckets by tag.
    pub bucket: Option<String>,

    /// Management marker tag key
    pub tag_key: String,

    /// Sid of the managed statement
    pub statement_id: String,

    /// Service name filter for the range directory
    pub service: String,

    /// ARN partition ("aws", "aws-cn", "aws-us-gov")
    pub partition: String,

    /// URL of the range directory
    pub ip_ranges_url: String,
}

impl Default for RestrictConfig {
    fn default() -> Self {
        RestrictConfig {
            region: None,
            bucket: None,
            tag_key: DEFAULT_TAG_KEY.to_string(),
            statement_id: DEFAULT_STATEMENT_ID.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            partition: DEFAULT_PARTITION.to_string(),
            ip_ranges_url: DEFAULT_IP_RANGES_URL.to_string(),
        }
    }
}

impl RestrictConfig {
    /// Start building a configuration from defaults
    pub fn builder() -> RestrictConfigBuilder {
        RestrictConfigBuilder::new()
    }

    /// Read configuration from process environment variables
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `REGION` (falls back to `AWS_REGION`) | `region` |
    /// | `BUCKET_NAME` | `bucket` |
    /// | `TAG_KEY` | `tag_key` |
    /// | `STATEMENT_ID` | `statement_id` |
    /// | `IP_SERVICE` | `service` |
    /// | `AWS_PARTITION` | `partition` |
    /// | `IP_RANGES_URL` | `ip_ranges_url` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = RestrictConfig::default();

        let config = RestrictConfig {
            region: get("REGION").or_else(|| get("AWS_REGION")),
            bucket: get("BUCKET_NAME"),
            tag_key: get("TAG_KEY").unwrap_or(defaults.tag_key),
            statement_id: get("STATEMENT_ID").unwrap_or(defaults.statement_id),
            service: get("IP_SERVICE").unwrap_or(defaults.service),
            partition: get("AWS_PARTITION").unwrap_or(defaults.partition),
            ip_ranges_url: get("IP_RANGES_URL").unwrap_or(defaults.ip_ranges_url),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: RestrictConfig = toml::from_str(toml_str)
            .map_err(|e| Error::Configuration(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check the settings that must hold for every run
    ///
    /// Region and bucket presence are checked later by [`require_region`](Self::require_region)
    /// and target resolution, since only some triggers need them.
    pub fn validate(&self) -> Result<()> {
        if self.statement_id.trim().is_empty() {
            return Err(Error::Configuration(
                "statement id cannot be empty".to_string(),
            ));
        }
        if self.service.trim().is_empty() {
            return Err(Error::Configuration("service cannot be empty".to_string()));
        }
        if self.partition.trim().is_empty() {
            return Err(Error::Configuration("partition cannot be empty".to_string()));
        }
        validate_tag_key(&self.tag_key)?;

        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            RegionId::new(region)?;
        }

        Ok(())
    }

    /// The target region, failing if it is not configured
    pub fn require_region(&self) -> Result<RegionId> {
        match self.region.as_deref() {
            Some(region) if !region.trim().is_empty() => RegionId::new(region),
            _ => Err(Error::Configuration("REGION must be set".to_string())),
        }
    }

    /// The fixed target bucket, if this deployment manages a single bucket
    pub fn fixed_bucket(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|b| !b.trim().is_empty())
    }
}

/// Fluent builder for [`RestrictConfig`]
///
/// # Examples
///
/// ```
/// use region_restrict::RestrictConfig;
///
/// let config = RestrictConfig::builder()
///     .region("us-east-1")
///     .bucket("my-bucket")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.fixed_bucket(), Some("my-bucket"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RestrictConfigBuilder {
    config: RestrictConfig,
}

impl RestrictConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration (e.g. one loaded from a file)
    pub fn from_config(config: RestrictConfig) -> Self {
        RestrictConfigBuilder { config }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = Some(region.into());
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = Some(bucket.into());
        self
    }

    pub fn tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.config.tag_key = tag_key.into();
        self
    }

    pub fn statement_id(mut self, statement_id: impl Into<String>) -> Self {
        self.config.statement_id = statement_id.into();
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.config.partition = partition.into();
        self
    }

    pub fn ip_ranges_url(mut self, url: impl Into<String>) -> Self {
        self.config.ip_ranges_url = url.into();
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<RestrictConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RestrictConfig::default();
        assert_eq!(config.statement_id, "DenyGetObjectForNonMatchingIp");
        assert_eq!(config.tag_key, "single-region-access");
        assert_eq!(config.service, "AMAZON");
        assert_eq!(config.partition, "aws");
        assert!(config.region.is_none());
        assert!(config.fixed_bucket().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = RestrictConfig::from_lookup(lookup(&[
            ("REGION", "eu-west-2"),
            ("BUCKET_NAME", "my-bucket"),
            ("TAG_KEY", "restricted"),
        ]))
        .unwrap();

        assert_eq!(config.region.as_deref(), Some("eu-west-2"));
        assert_eq!(config.fixed_bucket(), Some("my-bucket"));
        assert_eq!(config.tag_key, "restricted");
        assert_eq!(config.statement_id, DEFAULT_STATEMENT_ID);
    }

    #[test]
    fn test_from_lookup_region_fallback_and_empty_values() {
        let config = RestrictConfig::from_lookup(lookup(&[
            ("REGION", ""),
            ("AWS_REGION", "us-east-1"),
            ("BUCKET_NAME", "  "),
        ]))
        .unwrap();

        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert!(config.fixed_bucket().is_none());
    }

    #[test]
    fn test_from_lookup_rejects_bad_region() {
        let err = RestrictConfig::from_lookup(lookup(&[("REGION", "Nowhere")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_lookup_accepts_sovereign_region() {
        let config =
            RestrictConfig::from_lookup(lookup(&[("REGION", "eusc-de-east-1")])).unwrap();
        assert_eq!(config.require_region().unwrap().as_str(), "eusc-de-east-1");
    }

    #[test]
    fn test_require_region() {
        let config = RestrictConfig::default();
        assert!(matches!(
            config.require_region(),
            Err(Error::Configuration(_))
        ));

        let config = RestrictConfig::builder().region("us-east-1").build().unwrap();
        assert_eq!(config.require_region().unwrap().as_str(), "us-east-1");
    }

    #[test]
    fn test_builder_validation() {
        assert!(RestrictConfig::builder().statement_id("").build().is_err());
        assert!(RestrictConfig::builder().tag_key("aws:reserved").build().is_err());
        assert!(RestrictConfig::builder().partition("").build().is_err());
        assert!(RestrictConfig::builder()
            .partition("aws-us-gov")
            .region("us-gov-west-1")
            .build()
            .is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
region = "us-east-1"
tag_key = "single-region-access"
statement_id = "DenyGetObjectForNonMatchingIp"
"#
        )
        .unwrap();

        let config = RestrictConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.service, DEFAULT_SERVICE);
        assert_eq!(config.ip_ranges_url, DEFAULT_IP_RANGES_URL);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = RestrictConfig::from_toml_str("regoin = \"us-east-1\"").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
