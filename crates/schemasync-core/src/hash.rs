//! Content fingerprints for change detection
//!
//! Digests are lowercase hex SHA-256. They are compared for equality only and
//! never used for anything security related.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;

/// Hex SHA-256 of the exact bytes given
pub fn digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Digest of a spec's canonical form
///
/// The spec is canonicalized first and serialized as compact JSON with object
/// keys sorted, so equivalent encodings of the same values hash identically.
pub fn spec_hash(spec: &Value) -> String {
    let mut out = String::new();
    write_sorted(&canonicalize(spec), &mut out);
    digest(out.as_bytes())
}

fn write_sorted(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_sorted(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
