use crate::config::AppConfig;
use crate::service::HuntService;

#[derive(Clone)]
pub struct AppState {
    pub hunts: HuntService,
    pub config: AppConfig,
}
