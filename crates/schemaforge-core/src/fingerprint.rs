use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::schema::Schema;

/// SHA-256 of the canonical JSON form of a schema, hex encoded.
///
/// Maps keep insertion order, so two schemas that differ only in key order
/// get different fingerprints.
pub fn schema_fingerprint(schema: &Schema) -> Result<String> {
    let bytes = serde_json::to_vec(schema)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
