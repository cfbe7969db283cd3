//! The branch → deploy target map, stored as a single settings value.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::settings::keys::DEPLOY_TARGETS;
use crate::settings::{SettingsError, SettingsStore};
use crate::types::{BranchName, DeployTarget};

pub type DeployTargetMap = BTreeMap<BranchName, DeployTarget>;

/// Loads the map. Unset (or null) is an empty map.
///
/// # Errors
///
/// Returns `SettingsError::InvalidValue` if the stored value is not an object
/// of strings.
pub fn load_deploy_targets(store: &dyn SettingsStore) -> Result<DeployTargetMap, SettingsError> {
    match store.get(DEPLOY_TARGETS)? {
        None | Some(Value::Null) => Ok(DeployTargetMap::new()),
        Some(value) => serde_json::from_value(value).map_err(|_| SettingsError::InvalidValue {
            key: DEPLOY_TARGETS.to_string(),
            expected: "an object mapping branch names to deploy targets",
        }),
    }
}

/// Looks up the deploy target configured for `branch`.
///
/// A branch mapped to an empty target counts as unmapped.
pub fn deploy_target_for(
    store: &dyn SettingsStore,
    branch: &BranchName,
) -> Result<Option<DeployTarget>, SettingsError> {
    Ok(load_deploy_targets(store)?
        .remove(branch)
        .filter(|target| !target.as_str().is_empty()))
}

/// Sets the target for one branch, keeping the other entries.
///
/// This is a read-modify-write of the whole map; concurrent updates race and
/// the last write wins.
pub fn set_deploy_target(
    store: &dyn SettingsStore,
    branch: BranchName,
    target: DeployTarget,
) -> Result<DeployTargetMap, SettingsError> {
    let mut targets = load_deploy_targets(store)?;
    targets.insert(branch, target);

    let value = serde_json::to_value(&targets).map_err(|source| SettingsError::Json {
        key: DEPLOY_TARGETS.to_string(),
        source,
    })?;
    store.set(DEPLOY_TARGETS, value)?;

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;
    use serde_json::json;

    #[test]
    fn unset_is_empty() {
        let store = MemorySettingsStore::new();
        assert!(load_deploy_targets(&store).unwrap().is_empty());

        store.set(DEPLOY_TARGETS, Value::Null).unwrap();
        assert!(load_deploy_targets(&store).unwrap().is_empty());
    }

    #[test]
    fn set_preserves_other_branches() {
        let store = MemorySettingsStore::new();
        set_deploy_target(&store, BranchName::new("main"), DeployTarget::new("prod")).unwrap();
        set_deploy_target(
            &store,
            BranchName::new("feature/x"),
            DeployTarget::new("staging"),
        )
        .unwrap();
        set_deploy_target(&store, BranchName::new("main"), DeployTarget::new("live")).unwrap();

        assert_eq!(
            store.get(DEPLOY_TARGETS).unwrap(),
            Some(json!({"feature/x": "staging", "main": "live"}))
        );
        assert_eq!(
            deploy_target_for(&store, &BranchName::new("main")).unwrap(),
            Some(DeployTarget::new("live"))
        );
        assert_eq!(
            deploy_target_for(&store, &BranchName::new("dev")).unwrap(),
            None
        );
    }

    #[test]
    fn empty_target_is_unmapped() {
        let store = MemorySettingsStore::new();
        set_deploy_target(&store, BranchName::new("main"), DeployTarget::new("")).unwrap();

        assert_eq!(
            deploy_target_for(&store, &BranchName::new("main")).unwrap(),
            None
        );
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let store = MemorySettingsStore::new();
        store.set(DEPLOY_TARGETS, json!(["main"])).unwrap();

        assert!(matches!(
            load_deploy_targets(&store),
            Err(SettingsError::InvalidValue { .. })
        ));

        store.set(DEPLOY_TARGETS, json!({"main": 3})).unwrap();
        assert!(load_deploy_targets(&store).is_err());
    }
}
