use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::Settings;
use crate::store::StoreBackend;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn StoreBackend>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn StoreBackend>) -> Self {
        let jwt = Arc::new(JwtKeys::new(&settings.jwt));

        Self {
            settings: Arc::new(settings),
            store,
            jwt,
        }
    }
}
