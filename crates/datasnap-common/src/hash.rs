//! Content fingerprints for rows.

use datasnap_model::Record;
use sha2::{Digest, Sha256};

/// SHA-256 of the canonical JSON serialization of a row.
///
/// `Record` keeps its keys sorted, so two rows with equal contents always
/// produce the same fingerprint regardless of insertion order.
pub fn row_fingerprint(row: &Record) -> [u8; 32] {
    let bytes = serde_json::to_vec(row).unwrap_or_else(|_| format!("{row:?}").into_bytes());
    Sha256::digest(&bytes).into()
}
