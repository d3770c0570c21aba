//! The managed source-IP deny statement
//!
//! Denies `s3:GetObject` to every principal unless the request comes from one
//! of the region's published prefixes. The `Null` clause lets requests that
//! arrive through an S3 VPC endpoint through: gateway endpoints only exist
//! within a region, so endpoint traffic is always same-region.

use super::policy::Statement;
use serde::{Deserialize, Serialize};

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action (takes precedence over Allow)
    Deny,
}

/// Source-IP condition block of the managed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpCondition {
    pub not_ip_address: SourceIp,
    pub null: SourceVpc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIp {
    #[serde(rename = "aws:SourceIp")]
    pub source_ip: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceVpc {
    #[serde(rename = "aws:sourceVpc")]
    pub source_vpc: String,
}

/// Names the statement and the partition its resource ARN lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSpec<'a> {
    pub statement_id: &'a str,
    pub partition: &'a str,
}

/// The statement this crate owns inside a bucket policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedStatement {
    pub sid: String,
    pub effect: Effect,
    pub principal: String,
    pub action: String,
    pub resource: String,
    pub condition: IpCondition,
}

impl ManagedStatement {
    /// Build the deny statement for `bucket` allowing only `prefixes`
    ///
    /// Pure and deterministic: identical inputs always give identical statements.
    /// Prefix order is kept as given.
    pub fn build(spec: StatementSpec<'_>, bucket: &str, prefixes: &[String]) -> Self {
        ManagedStatement {
            sid: spec.statement_id.to_string(),
            effect: Effect::Deny,
            principal: "*".to_string(),
            action: "s3:GetObject".to_string(),
            resource: format!("arn:{}:s3:::{}/*", spec.partition, bucket),
            condition: IpCondition {
                not_ip_address: SourceIp {
                    source_ip: prefixes.to_vec(),
                },
                null: SourceVpc {
                    source_vpc: "true".to_string(),
                },
            },
        }
    }

    /// Convert into an opaque policy statement
    pub fn into_statement(self) -> Result<Statement, serde_json::Error> {
        serde_json::to_value(self).map(Statement::from_value)
    }

    /// Read a managed statement back out of an opaque one
    pub fn from_statement(statement: &Statement) -> Result<Self, serde_json::Error> {
        serde_json::from_value(statement.as_value().clone())
    }
}
