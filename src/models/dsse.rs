use serde::{Deserialize, Serialize};

/// Serializable DSSE envelope as submitted by clients.
///
/// Payload and signatures stay base64-encoded here; decoding happens when
/// converting into [`crate::dsse::Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The type/format of the payload
    pub payload_type: String,
    /// The base64-encoded payload data
    pub payload: String,
    /// One or more digital signatures
    pub signatures: Vec<Signature>,
}

/// Serializable signature within a DSSE envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Optional hint naming the key that produced the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyid: Option<String>,
    /// The base64-encoded signature bytes
    pub sig: String,
}
