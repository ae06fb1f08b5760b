//! Tool registry: the built-in catalog, HMAC-signed and persisted at
//! startup, plus per-tool parameter schema resolution.

pub mod catalog;
pub mod schemas;

use crate::model::ToolDefinition;
use crate::signing;
use crate::storage::store::Store;

use anyhow::Context;

pub use schemas::{ParamSchema, SchemaViolation};

#[derive(Clone)]
pub struct ToolRegistry {
    store: Store,
}

impl ToolRegistry {
    /// Sign every catalog tool with the current secret and insert it if the
    /// (tool_id, version) pair is absent. Safe to run on every startup.
    pub fn bootstrap(store: Store) -> anyhow::Result<Self> {
        let tools = catalog::default_catalog();
        let count = tools.len();
        for mut def in tools {
            def.signature = signing::sign_tool(&def.id, &def.version, &def.input_schema);
            let json = serde_json::to_string(&def).context("serialize tool definition")?;
            store.insert_tool_if_absent(&def.id, &def.version, &json)?;
        }
        tracing::info!(event = "registry_bootstrap", tools = count);
        Ok(Self { store })
    }

    pub fn list(&self) -> anyhow::Result<Vec<ToolDefinition>> {
        let mut out = Vec::new();
        for json in self.store.list_tool_definitions()? {
            out.push(serde_json::from_str(&json).context("parse stored tool definition")?);
        }
        Ok(out)
    }

    pub fn get(&self, tool_id: &str, version: &str) -> anyhow::Result<Option<ToolDefinition>> {
        match self.store.get_tool_definition(tool_id, version)? {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).context("parse stored tool definition")?,
            )),
            None => Ok(None),
        }
    }

    /// Resolve the parameter schema for a tool id. Ids without a registered
    /// schema fall back to the permissive accept-all variant.
    pub fn schema_for(&self, tool_id: &str) -> &'static ParamSchema {
        if !schemas::is_registered(tool_id) {
            tracing::debug!(tool_id, "no parameter schema registered; using permissive schema");
        }
        schemas::schema_for(tool_id)
    }
}
