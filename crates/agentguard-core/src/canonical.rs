//! Canonical JSON encoding and the hashes derived from it.
//!
//! Canonical means: object keys sorted lexicographically at every depth,
//! compact separators. Both signing and request hashing go through this
//! encoder so the two subsystems cannot drift apart.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Serialize `value` with recursively sorted object keys.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys serialize through serde_json for correct escaping.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Hex SHA-256 of the canonical encoding of a JSON value.
pub fn hash_value(value: &Value) -> String {
    sha256_hex(&canonical_json(value))
}

/// Hash each parameter value independently so an audit consumer can confirm
/// whether one specific parameter was unchanged without revealing the others.
pub fn hash_params(params: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in params {
        out.insert(key.clone(), Value::String(hash_value(value)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_depth() {
        let v = json!({"b": 1, "a": {"z": true, "m": [{"y": 2, "x": 1}]}});
        assert_eq!(
            canonical_json(&v),
            r#"{"a":{"m":[{"x":1,"y":2}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn hashing_is_deterministic_across_key_order() {
        let a = json!({"limit": 5, "path": "/tmp"});
        let b = json!({"path": "/tmp", "limit": 5});
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn params_hash_is_per_key() {
        let params = json!({"limit": 5, "series": "latency"});
        let hashed = hash_params(params.as_object().unwrap());
        assert_eq!(hashed.len(), 2);
        assert_eq!(
            hashed["limit"],
            Value::String(sha256_hex("5"))
        );
        assert_ne!(hashed["limit"], hashed["series"]);
    }
}
