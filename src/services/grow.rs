//! `GrowService`: deploy configuration and manual deploys.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::deploy::{DeployTrigger, load_deploy_targets, set_deploy_target};
use crate::rpc::{RpcError, RpcService, parse_params, success};
use crate::settings::keys::{DEPLOY_SERVICE_HOST, DEPLOY_TARGETS};
use crate::settings::{SettingsError, SettingsStore, set_string};
use crate::types::{BranchName, CommitId, DeployTarget};

pub const SERVICE_NAME: &str = "GrowService";

const METHODS: &[&str] = &[
    "Deploy",
    "SetDeployServiceHost",
    "SetDeployTarget",
    "GetDeployTargets",
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeployArgs {
    commit_id: CommitId,
    #[serde(default)]
    deploy_target: DeployTarget,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetDeployServiceHostArgs {
    host: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetDeployTargetArgs {
    branch: BranchName,
    deploy_target: DeployTarget,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

pub struct GrowService {
    settings: Arc<dyn SettingsStore>,
    trigger: DeployTrigger,
}

impl GrowService {
    pub fn new(settings: Arc<dyn SettingsStore>, trigger: DeployTrigger) -> Self {
        GrowService { settings, trigger }
    }
}

#[async_trait]
impl RpcService for GrowService {
    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value, RpcError> {
        let store = self.settings.as_ref();
        match method {
            "Deploy" => {
                let args: DeployArgs = parse_params(params)?;
                self.trigger.deploy(args.commit_id, args.deploy_target).await?;
                Ok(success())
            }
            "SetDeployServiceHost" => {
                let args: SetDeployServiceHostArgs = parse_params(params)?;
                info!(host = %args.host, "Deploy service host updated");
                set_string(store, DEPLOY_SERVICE_HOST, args.host)?;
                Ok(success())
            }
            "SetDeployTarget" => {
                let args: SetDeployTargetArgs = parse_params(params)?;
                info!(branch = %args.branch, deploy_target = %args.deploy_target, "Deploy target set");
                set_deploy_target(store, args.branch, args.deploy_target)?;
                Ok(success())
            }
            "GetDeployTargets" => {
                let NoArgs {} = parse_params(params)?;
                let targets = load_deploy_targets(store)?;
                serde_json::to_value(targets).map_err(|source| {
                    RpcError::Settings(SettingsError::Json {
                        key: DEPLOY_TARGETS.to_string(),
                        source,
                    })
                })
            }
            _ => Err(RpcError::MethodNotFound {
                service: SERVICE_NAME.to_string(),
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::DEPLOY_TASK_PATH;
    use crate::settings::MemorySettingsStore;
    use crate::settings::keys::{GITHUB_ACCESS_TOKEN, GITHUB_REPO};
    use crate::test_utils::RecordingQueue;
    use serde_json::json;

    fn kwargs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn service() -> (GrowService, Arc<MemorySettingsStore>, Arc<RecordingQueue>) {
        let settings = Arc::new(MemorySettingsStore::new());
        let queue = Arc::new(RecordingQueue::default());
        let trigger = DeployTrigger::new(settings.clone(), queue.clone());
        (GrowService::new(settings.clone(), trigger), settings, queue)
    }

    #[tokio::test]
    async fn deploy_defaults_target() {
        let (service, settings, queue) = service();
        set_string(settings.as_ref(), GITHUB_REPO, "octocat/site").unwrap();
        set_string(settings.as_ref(), GITHUB_ACCESS_TOKEN, "tok").unwrap();

        let result = service
            .call("Deploy", kwargs(json!({"commit_id": "abc123"})))
            .await
            .unwrap();
        assert_eq!(result, json!({"success": true}));

        let tasks = queue.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].0, DEPLOY_TASK_PATH);
        assert_eq!(tasks[0].1["deploy_target"], json!("default"));
        assert_eq!(tasks[0].1["commit_id"], json!("abc123"));
    }

    #[tokio::test]
    async fn deploy_without_credentials_fails() {
        let (service, _, queue) = service();

        let err = service
            .call("Deploy", kwargs(json!({"commit_id": "abc123", "deploy_target": "prod"})))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("github_repo"));
        assert!(queue.tasks().is_empty());
    }

    #[tokio::test]
    async fn set_deploy_target_upserts() {
        let (service, settings, _) = service();

        service
            .call(
                "SetDeployTarget",
                kwargs(json!({"branch": "main", "deploy_target": "prod"})),
            )
            .await
            .unwrap();
        service
            .call(
                "SetDeployTarget",
                kwargs(json!({"branch": "dev", "deploy_target": "staging"})),
            )
            .await
            .unwrap();

        assert_eq!(
            settings.get(DEPLOY_TARGETS).unwrap(),
            Some(json!({"main": "prod", "dev": "staging"}))
        );
        assert_eq!(
            service.call("GetDeployTargets", Map::new()).await.unwrap(),
            json!({"main": "prod", "dev": "staging"})
        );
    }

    #[tokio::test]
    async fn get_deploy_targets_unset_is_empty_object() {
        let (service, _, _) = service();
        assert_eq!(
            service.call("GetDeployTargets", Map::new()).await.unwrap(),
            json!({})
        );
    }

    #[tokio::test]
    async fn set_deploy_service_host() {
        let (service, settings, _) = service();

        service
            .call(
                "SetDeployServiceHost",
                kwargs(json!({"host": "https://deploy.example.com"})),
            )
            .await
            .unwrap();

        assert_eq!(
            settings.get(DEPLOY_SERVICE_HOST).unwrap(),
            Some(json!("https://deploy.example.com"))
        );
    }
}
