//! HMAC-SHA256 signatures over tool definitions.
//!
//! The signed message is `tool_id|version|canonical_json(input_schema)`.
//! The shared secret is re-read from the environment on every operation so
//! rotating `ENFORCEMENT_HMAC_KEY` takes effect at restart without any
//! cached state.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::canonical::canonical_json;
use crate::model::ToolDefinition;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_ENV: &str = "ENFORCEMENT_HMAC_KEY";
pub const DEV_SECRET: &str = "dev-secret";

fn secret() -> Vec<u8> {
    std::env::var(SECRET_ENV)
        .unwrap_or_else(|_| DEV_SECRET.to_string())
        .into_bytes()
}

/// True when no secret is configured and the development default is in use.
pub fn using_dev_secret() -> bool {
    std::env::var(SECRET_ENV).is_err()
}

/// Compute the hex HMAC-SHA256 signature for a tool definition.
pub fn sign_tool(tool_id: &str, version: &str, input_schema: &Value) -> String {
    let msg = format!("{tool_id}|{version}|{}", canonical_json(input_schema));
    let mut mac =
        HmacSha256::new_from_slice(&secret()).expect("HMAC accepts any key length");
    mac.update(msg.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a stored definition against the current secret.
///
/// Constant-time comparison of the hex digests to prevent timing attacks.
pub fn verify_tool(def: &ToolDefinition) -> bool {
    let expected = sign_tool(&def.id, &def.version, &def.input_schema);
    expected.as_bytes().ct_eq(def.signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_round_trip() {
        let schema = json!({"limit": {"type": "integer", "max": 100}});
        let def = ToolDefinition {
            id: "mcp:read_logs".into(),
            version: "1.0.0".into(),
            description: "Read audit logs".into(),
            input_schema: schema.clone(),
            example_calls: vec![],
            signature: sign_tool("mcp:read_logs", "1.0.0", &schema),
        };
        assert!(verify_tool(&def));
    }

    #[test]
    fn tampered_schema_fails_verification() {
        let schema = json!({"limit": {"type": "integer", "max": 100}});
        let mut def = ToolDefinition {
            id: "mcp:read_logs".into(),
            version: "1.0.0".into(),
            description: "Read audit logs".into(),
            input_schema: schema.clone(),
            example_calls: vec![],
            signature: sign_tool("mcp:read_logs", "1.0.0", &schema),
        };
        def.input_schema = json!({"limit": {"type": "integer", "max": 100000}});
        assert!(!verify_tool(&def));
    }

    #[test]
    fn signature_ignores_schema_key_order() {
        let a = json!({"series": {"type": "string"}, "value": {"type": "number"}});
        let b = json!({"value": {"type": "number"}, "series": {"type": "string"}});
        assert_eq!(
            sign_tool("mcp:metrics_write", "1.0.0", &a),
            sign_tool("mcp:metrics_write", "1.0.0", &b)
        );
    }
}
