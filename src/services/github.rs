//! `GitHubService`: GitHub credentials and repository configuration.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::rpc::{RpcError, RpcService, parse_params, success};
use crate::settings::keys::{GITHUB_ACCESS_TOKEN, GITHUB_REPO, GITHUB_WEBHOOK_SECRET};
use crate::settings::{SettingsStore, get_string, set_string};

pub const SERVICE_NAME: &str = "GitHubService";

const METHODS: &[&str] = &["SetAccessToken", "SetWebHookSecret", "SetRepo", "GetRepo"];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetAccessTokenArgs {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetWebHookSecretArgs {
    secret: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetRepoArgs {
    repo: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

pub struct GitHubService {
    settings: Arc<dyn SettingsStore>,
}

impl GitHubService {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        GitHubService { settings }
    }
}

#[async_trait]
impl RpcService for GitHubService {
    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value, RpcError> {
        let store = self.settings.as_ref();
        match method {
            "SetAccessToken" => {
                let args: SetAccessTokenArgs = parse_params(params)?;
                set_string(store, GITHUB_ACCESS_TOKEN, args.access_token)?;
                info!("GitHub access token updated");
                Ok(success())
            }
            "SetWebHookSecret" => {
                let args: SetWebHookSecretArgs = parse_params(params)?;
                set_string(store, GITHUB_WEBHOOK_SECRET, args.secret)?;
                info!("Webhook secret updated");
                Ok(success())
            }
            "SetRepo" => {
                let args: SetRepoArgs = parse_params(params)?;
                info!(repo = %args.repo, "GitHub repo updated");
                set_string(store, GITHUB_REPO, args.repo)?;
                Ok(success())
            }
            "GetRepo" => {
                let NoArgs {} = parse_params(params)?;
                Ok(get_string(store, GITHUB_REPO)?.map_or(Value::Null, Value::String))
            }
            _ => Err(RpcError::MethodNotFound {
                service: SERVICE_NAME.to_string(),
                method: method.to_string(),
            }),
        }
    }
}
