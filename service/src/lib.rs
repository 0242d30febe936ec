use config::Config;
use ws::Hub;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, hub: Hub) -> Self {
        Self {
            hub,
            config: app_config,
        }
    }
}
