/// Serialization models for in-toto statements.
pub mod models;

pub use models::{Statement, Subject};

/// Parses an in-toto statement from a DSSE payload.
///
/// # Arguments
/// * `payload` - Raw payload bytes of an `application/vnd.in-toto+json` envelope
///
/// # Returns
/// * `Result<Statement, serde_json::Error>` - The statement, or error if the payload is not one
pub fn parse_statement(payload: &[u8]) -> Result<Statement, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Every `(algorithm, digest)` pair declared by the statement's subjects.
///
/// Subjects keep their declared order; within a subject pairs are ordered by algorithm.
pub fn subject_digests(statement: &Statement) -> Vec<(String, String)> {
    statement
        .subject
        .iter()
        .flat_map(|subject| {
            subject
                .digest
                .iter()
                .map(|(alg, digest)| (alg.clone(), digest.clone()))
        })
        .collect()
}
