//! Bucket policy document structure
//!
//! Only the managed statement is ever interpreted. Every other statement and
//! every other top-level key is carried through as raw JSON so it is written
//! back exactly as it was read.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Policy language version written into freshly created documents
pub const POLICY_VERSION: &str = "2012-10-17";

/// A single policy statement, kept as opaque JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statement(Value);

impl Statement {
    /// Wrap a raw JSON statement
    pub fn from_value(value: Value) -> Self {
        Statement(value)
    }

    /// Statement ID, if present and a string
    pub fn sid(&self) -> Option<&str> {
        self.0.get("Sid").and_then(Value::as_str)
    }

    /// Check whether this statement carries the given Sid
    pub fn has_sid(&self, sid: &str) -> bool {
        self.sid() == Some(sid)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Complete bucket policy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Ordered policy statements
    #[serde(default, deserialize_with = "one_or_many")]
    pub statement: Vec<Statement>,

    /// Any other top-level keys (`Id`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

/// AWS accepts `Statement` as a single object as well as an array
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Statement>),
        One(Statement),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(statements) => statements,
        OneOrMany::One(statement) => vec![statement],
    })
}

impl PolicyDocument {
    /// Create an empty policy (used when a bucket has no policy attached)
    pub fn new() -> Self {
        PolicyDocument {
            version: default_version(),
            statement: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add a statement to the end of this policy
    pub fn add_statement(&mut self, statement: Statement) {
        self.statement.push(statement);
    }

    /// Remove every statement with the given Sid, returning how many were removed
    pub fn remove_statements(&mut self, sid: &str) -> usize {
        let before = self.statement.len();
        self.statement.retain(|s| !s.has_sid(sid));
        before - self.statement.len()
    }

    /// Statements carrying the given Sid
    pub fn statements_with_sid<'a>(&'a self, sid: &'a str) -> impl Iterator<Item = &'a Statement> {
        self.statement.iter().filter(move |s| s.has_sid(sid))
    }

    /// A document with no statements cannot be stored as a bucket policy
    pub fn is_empty(&self) -> bool {
        self.statement.is_empty()
    }

    /// Parse policy from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize policy to the compact JSON sent to the storage API
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}
