use std::sync::Arc;

use agentguard_core::enforcement::EnforcementService;
use agentguard_core::policy::seed::seed_demo_policy;
use agentguard_core::policy::PolicyStore;
use agentguard_core::registry::ToolRegistry;
use agentguard_core::storage::store::Store;

use crate::config::ServerConfig;

/// Shared application state passed to all API handlers. Everything in here
/// is a cheap handle over the single SQLite connection; the database stays
/// the source of truth.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub registry: ToolRegistry,
    pub policies: PolicyStore,
    pub enforcement: EnforcementService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the configured database and bring up every component in
    /// dependency order: schema, signed tool catalog, optional demo seed.
    pub fn initialize(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Store::open(&config.database_file)?;
        Self::from_store(store, config)
    }

    /// Same bootstrap over an existing store; tests hand in an in-memory one.
    pub fn from_store(store: Store, config: ServerConfig) -> anyhow::Result<Self> {
        store.init_schema()?;
        let registry = ToolRegistry::bootstrap(store.clone())?;
        let policies = PolicyStore::new(store.clone());

        if config.auto_seed {
            // Best-effort: a failed seed must not keep the service down.
            if let Err(e) = seed_demo_policy(&store) {
                tracing::warn!(error = %e, "demo policy seed failed");
            }
        }

        let enforcement =
            EnforcementService::new(registry.clone(), policies.clone(), store.clone());
        Ok(Self {
            store,
            registry,
            policies,
            enforcement,
            config: Arc::new(config),
        })
    }
}
