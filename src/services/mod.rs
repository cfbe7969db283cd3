//! The RPC services exposed on `/_/rpc`.

pub mod github;
pub mod grow;

use std::sync::Arc;

use crate::deploy::DeployTrigger;
use crate::rpc::RpcRegistry;
use crate::settings::SettingsStore;

pub use github::GitHubService;
pub use grow::GrowService;

/// Builds the registry with every service registered under its public name.
pub fn default_registry(settings: Arc<dyn SettingsStore>, trigger: DeployTrigger) -> RpcRegistry {
    RpcRegistry::new()
        .with_service(
            github::SERVICE_NAME,
            Arc::new(GitHubService::new(settings.clone())),
        )
        .with_service(grow::SERVICE_NAME, Arc::new(GrowService::new(settings, trigger)))
}
