//! Installation lifecycle as the host drives it.
//!
//! The app never changes its own state; the host sends a lifecycle call and
//! the app reacts. This module models the transitions the host performs so
//! tooling can check which hooks an app will see, and in what order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use appbridge_core::LifecycleHook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    NotInstalled,
    Installed,
    Enabled,
    Disabled,
    Uninstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{hook} cannot fire while the app is {from:?}")]
pub struct InvalidTransition {
    pub from: LifecycleState,
    pub hook: LifecycleHook,
}

impl LifecycleState {
    /// The state the host moves to after delivering `hook`.
    pub fn apply(self, hook: LifecycleHook) -> Result<Self, InvalidTransition> {
        use LifecycleHook::*;
        use LifecycleState::*;

        match (self, hook) {
            (NotInstalled | Uninstalled, OnInstall) => Ok(Installed),
            (Installed | Disabled, OnEnable) => Ok(Enabled),
            (Installed | Enabled, OnDisable) => Ok(Disabled),
            (Installed | Enabled | Disabled, OnUninstall) => Ok(Uninstalled),
            (Installed | Enabled, OnVersionChanged) => Ok(self),
            (from, hook) => Err(InvalidTransition { from, hook }),
        }
    }

    /// Apply `hooks` in order starting from `self`.
    pub fn replay(
        self,
        hooks: impl IntoIterator<Item = LifecycleHook>,
    ) -> Result<Self, InvalidTransition> {
        hooks.into_iter().try_fold(self, LifecycleState::apply)
    }
}
