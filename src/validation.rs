//! Validation for region identifiers, tag keys and bucket ARNs
//!
//! Bucket names themselves are not validated here; the storage API is the
//! authority on bucket naming and rejects bad names on its own.

use crate::error::{Error, Result};
use regex::Regex;

/// Validated AWS region identifier
///
/// # Rules
/// - Lowercase partition-style prefix, one or more words, trailing number
/// - Examples: "us-east-1", "eu-west-2", "us-gov-west-1", "cn-north-1", "eusc-de-east-1"
///
/// # Examples
///
/// ```
/// use region_restrict::validation::RegionId;
///
/// let region = RegionId::new("us-east-1").unwrap();
/// assert_eq!(region.as_str(), "us-east-1");
///
/// assert!(RegionId::new("US-EAST-1").is_err());
/// assert!(RegionId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionId(String);

impl RegionId {
    /// Pattern for AWS region identifiers
    const PATTERN: &'static str = r"^[a-z]{2,}(-[a-z]+)+-[0-9]+$";

    /// Create a new validated region identifier
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the identifier is empty or malformed.
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        Self::validate_region(&region)?;
        Ok(RegionId(region))
    }

    fn validate_region(region: &str) -> Result<()> {
        if region.is_empty() {
            return Err(Error::Configuration("region cannot be empty".to_string()));
        }

        let re = Regex::new(Self::PATTERN).map_err(|e| Error::Configuration(e.to_string()))?;
        if !re.is_match(region) {
            return Err(Error::Configuration(format!(
                "region '{}' is not a valid AWS region identifier",
                region
            )));
        }

        Ok(())
    }

    /// Get the region as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a resource tag key
///
/// Tag keys are 1-128 characters of letters, digits, whitespace and `_.:/=+-@`,
/// and may not use the reserved `aws:` prefix.
pub fn validate_tag_key(key: &str) -> Result<()> {
    if key.is_empty() || key.chars().count() > 128 {
        return Err(Error::Configuration(format!(
            "tag key must be 1-128 characters, got {}",
            key.chars().count()
        )));
    }

    let re = Regex::new(r"^[\p{L}\p{Z}\p{N}_.:/=+\-@]+$")
        .map_err(|e| Error::Configuration(e.to_string()))?;
    if !re.is_match(key) {
        return Err(Error::Configuration(format!(
            "tag key '{}' contains characters not allowed in tag keys",
            key
        )));
    }

    if key.to_ascii_lowercase().starts_with("aws:") {
        return Err(Error::Configuration(format!(
            "tag key '{}' uses the reserved aws: prefix",
            key
        )));
    }

    Ok(())
}

/// Extract the bucket name from an S3 bucket ARN
///
/// Example: "arn:aws:s3:::first-bucket" → "first-bucket"
///
/// Object ARNs (containing a `/`) and ARNs of other services are rejected.
pub fn bucket_from_arn(arn: &str) -> Result<&str> {
    let mut parts = arn.splitn(6, ':');
    let (scheme, partition, service, region, account, resource) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    );

    match (scheme, partition, service, region, account, resource) {
        (Some("arn"), Some(p), Some("s3"), Some(""), Some(""), Some(bucket))
            if !p.is_empty() && !bucket.is_empty() && !bucket.contains('/') =>
        {
            Ok(bucket)
        }
        _ => Err(Error::Discovery(format!(
            "'{}' is not an S3 bucket ARN",
            arn
        ))),
    }
}
