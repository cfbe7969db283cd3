//! Well-known setting keys and typed accessors over them.

use serde_json::Value;

use super::store::{Result, SettingsError, SettingsStore};

/// Token used to authenticate against GitHub on behalf of the deploy service.
pub const GITHUB_ACCESS_TOKEN: &str = "github_access_token";

/// Shared secret for verifying `X-Hub-Signature` on push webhooks.
pub const GITHUB_WEBHOOK_SECRET: &str = "github_webhook_secret";

/// Repository to deploy, in `owner/repo` form.
pub const GITHUB_REPO: &str = "github_repo";

/// Base URL of the external deploy service (its RPC endpoint is `<host>/_/rpc`).
pub const DEPLOY_SERVICE_HOST: &str = "deploy_service_host";

/// JSON object mapping branch names to deploy targets.
pub const DEPLOY_TARGETS: &str = "deploy_targets";

/// Reads a string setting.
///
/// Returns `Ok(None)` when the key was never set or holds JSON `null`.
///
/// # Errors
///
/// Returns `SettingsError::InvalidValue` if the stored value is not a string.
pub fn get_string(store: &dyn SettingsStore, key: &str) -> Result<Option<String>> {
    match store.get(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

/// Reads a string setting that must be configured at the point of use.
///
/// An empty string counts as unset.
///
/// # Errors
///
/// Returns `SettingsError::Missing` if the setting is absent, null, or empty.
pub fn require_string(store: &dyn SettingsStore, key: &str) -> Result<String> {
    match get_string(store, key)? {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(SettingsError::Missing {
            key: key.to_string(),
        }),
    }
}

/// Stores a string setting.
pub fn set_string(store: &dyn SettingsStore, key: &str, value: impl Into<String>) -> Result<()> {
    store.set(key, Value::String(value.into()))
}
