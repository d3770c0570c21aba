//! Address-range resolution
//!
//! Fetches the published `ip-ranges.json` directory and keeps the prefixes of
//! one service in one region, IPv4 first and IPv6 second, in document order.

use crate::error::{Error, Result};
use crate::validation::RegionId;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use ipnetwork::{Ipv4Network, Ipv6Network};
use serde::Deserialize;
use tracing::{debug, info};

/// Source of the raw address-range directory document
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch the directory as JSON text
    async fn fetch(&self) -> Result<String>;
}

/// Timestamp format of the directory's `createDate`
const CREATE_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// The published address-range directory
#[derive(Debug, Clone, Deserialize)]
pub struct IpRangeDirectory {
    #[serde(rename = "syncToken", default)]
    pub sync_token: Option<String>,

    #[serde(rename = "createDate", default)]
    pub create_date: Option<String>,

    /// IPv4 entries
    pub prefixes: Vec<Ipv4Entry>,

    /// IPv6 entries
    pub ipv6_prefixes: Vec<Ipv6Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ipv4Entry {
    pub ip_prefix: String,
    pub region: String,
    pub service: String,
    #[serde(default)]
    pub network_border_group: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ipv6Entry {
    pub ipv6_prefix: String,
    pub region: String,
    pub service: String,
    #[serde(default)]
    pub network_border_group: Option<String>,
}

impl IpRangeDirectory {
    /// Parse the directory, failing if the prefix lists are missing
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Resolution(format!("malformed ip range directory: {}", e)))
    }

    /// Publication time of the directory, if present and well formed
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_date
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, CREATE_DATE_FORMAT).ok())
            .map(|naive| naive.and_utc())
    }

    /// Prefixes published for `service` in `region`, IPv4 then IPv6
    ///
    /// Every retained prefix must parse as a network of its family.
    pub fn prefixes_for(&self, service: &str, region: &str) -> Result<Vec<String>> {
        let mut prefixes = Vec::new();

        for entry in self
            .prefixes
            .iter()
            .filter(|e| e.service == service && e.region == region)
        {
            entry.ip_prefix.parse::<Ipv4Network>().map_err(|e| {
                Error::Resolution(format!("invalid IPv4 prefix '{}': {}", entry.ip_prefix, e))
            })?;
            prefixes.push(entry.ip_prefix.clone());
        }

        for entry in self
            .ipv6_prefixes
            .iter()
            .filter(|e| e.service == service && e.region == region)
        {
            entry.ipv6_prefix.parse::<Ipv6Network>().map_err(|e| {
                Error::Resolution(format!(
                    "invalid IPv6 prefix '{}': {}",
                    entry.ipv6_prefix, e
                ))
            })?;
            prefixes.push(entry.ipv6_prefix.clone());
        }

        Ok(prefixes)
    }
}

/// Resolves the allowed prefixes for a region
pub struct RangeResolver<'a, R: RangeSource + ?Sized> {
    source: &'a R,
    service: &'a str,
}

impl<'a, R: RangeSource + ?Sized> RangeResolver<'a, R> {
    pub fn new(source: &'a R, service: &'a str) -> Self {
        RangeResolver { source, service }
    }

    /// Fetch the directory and return the prefixes of `region`
    ///
    /// No deduplication: the published directory is already unique per
    /// service, region and prefix.
    pub async fn resolve(&self, region: &RegionId) -> Result<Vec<String>> {
        let json = self.source.fetch().await.map_err(|e| match e {
            Error::Resolution(_) => e,
            other => Error::Resolution(other.to_string()),
        })?;
        let directory = IpRangeDirectory::from_json(&json)?;

        debug!(
            "Range directory syncToken={:?} created={:?}",
            directory.sync_token,
            directory.created_at()
        );

        let prefixes = directory.prefixes_for(self.service, region.as_str())?;
        info!(
            "Resolved {} {} prefixes for {}",
            prefixes.len(),
            self.service,
            region
        );
        Ok(prefixes)
    }
}
