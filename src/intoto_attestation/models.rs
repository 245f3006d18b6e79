use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable representation of an in-toto statement.
///
/// Only `subject` matters to the log; the rest is decoded leniently so that any
/// statement with well-formed subjects can be indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// The statement type identifier
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// List of subjects (artifacts) this statement refers to
    #[serde(default)]
    pub subject: Vec<Subject>,
    /// URI identifying the predicate type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate_type: Option<String>,
    /// The predicate content as arbitrary JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Value>,
}

/// Represents a subject (artifact) in an in-toto statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Name or identifier of the artifact
    #[serde(default)]
    pub name: String,
    /// Map of digest algorithm names to their digest values
    #[serde(default)]
    pub digest: BTreeMap<String, String>,
}
