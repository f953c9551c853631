use std::sync::Arc;

use crate::config::Config;
use crate::conversation::{ChatDriver, SessionRegistry};
use crate::entitlement::EntitlementResolver;
use crate::extract::UpdateExtractor;
use crate::gateway::GatewayRegistry;
use crate::store::Store;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub sessions: SessionRegistry,
    pub driver: Arc<ChatDriver>,
}

impl AppState {
    pub fn new(config: Config, store: Store, gateways: GatewayRegistry) -> Self {
        let entitlements = EntitlementResolver::new(
            store.clone(),
            config.provider_order.clone(),
            config.default_provider,
            config.platform_keys.clone(),
        )
        .restricted_to(&gateways.providers());
        let driver = Arc::new(ChatDriver::new(
            gateways,
            entitlements,
            UpdateExtractor::new(&config.update_label),
            config.history_window,
        ));
        Self {
            config,
            store,
            sessions: SessionRegistry::new(),
            driver,
        }
    }
}
