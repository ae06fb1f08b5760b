use agentguard_core::registry::{ParamSchema, ToolRegistry};
use agentguard_core::signing;
use agentguard_core::storage::store::Store;

fn registry() -> (ToolRegistry, Store) {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    let registry = ToolRegistry::bootstrap(store.clone()).unwrap();
    (registry, store)
}

#[test]
fn bootstrap_loads_catalog_idempotently() {
    let (registry, store) = registry();
    assert_eq!(registry.list().unwrap().len(), 8);

    // A second bootstrap over the same store inserts nothing new.
    let registry = ToolRegistry::bootstrap(store).unwrap();
    assert_eq!(registry.list().unwrap().len(), 8);
}

#[test]
fn every_stored_tool_verifies_against_the_current_secret() {
    let (registry, _store) = registry();
    for tool in registry.list().unwrap() {
        assert!(
            signing::verify_tool(&tool),
            "signature mismatch for {}",
            tool.id
        );
        assert_eq!(
            tool.signature,
            signing::sign_tool(&tool.id, &tool.version, &tool.input_schema)
        );
    }
}

#[test]
fn lookup_is_exact_on_id_and_version() {
    let (registry, _store) = registry();
    assert!(registry.get("mcp:read_logs", "1.0.0").unwrap().is_some());
    assert!(registry.get("mcp:read_logs", "1.0").unwrap().is_none());
    assert!(registry.get("mcp:missing", "1.0.0").unwrap().is_none());
}

#[test]
fn catalog_ids_resolve_to_field_schemas() {
    let (registry, _store) = registry();
    for tool in registry.list().unwrap() {
        assert!(
            matches!(registry.schema_for(&tool.id), ParamSchema::Fields(_)),
            "catalog tool {} should have a registered schema",
            tool.id
        );
    }
    assert!(matches!(
        registry.schema_for("something:else"),
        ParamSchema::Permissive
    ));
}

#[test]
fn catalog_schemas_agree_on_field_names() {
    // Every field declared in a tool's input_schema must be understood by
    // the validator registered for that tool.
    let (registry, _store) = registry();
    for tool in registry.list().unwrap() {
        let declared = tool.input_schema.as_object().unwrap();
        let ParamSchema::Fields(fields) = registry.schema_for(&tool.id) else {
            panic!("catalog tool {} lost its schema", tool.id);
        };
        for name in declared.keys() {
            assert!(
                fields.iter().any(|f| f.name == name),
                "field {} of {} has no validator",
                name,
                tool.id
            );
        }
    }
}
