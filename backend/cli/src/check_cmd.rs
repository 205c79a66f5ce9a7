//! `appbridge check`: validate an app definition and its configuration.

use anyhow::{bail, Result};

use appbridge_apps::ExampleApp;
use appbridge_config::PreparedConfig;
use appbridge_core::{
    collect_call_paths, Binding, CallRequest, ExpandLevel, LifecycleHook, Manifest, Permission,
};
use appbridge_dispatch::{App, LifecycleState};

use crate::config::deploy_target;

/// Host-driven order in which lifecycle calls are exercised.
const LIFECYCLE_SEQUENCE: [LifecycleHook; 5] = [
    LifecycleHook::OnInstall,
    LifecycleHook::OnVersionChanged,
    LifecycleHook::OnDisable,
    LifecycleHook::OnEnable,
    LifecycleHook::OnUninstall,
];

pub fn run(kind: ExampleApp, prepared: &PreparedConfig) -> Result<()> {
    let config = &prepared.config;
    println!("\nChecking {kind}...\n");

    println!("Configuration:");
    for warning in &prepared.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    println!("  🟢 listen address {}", config.listen_addr());
    println!("  🟢 root URL {}", config.root_url());
    println!("  🟢 outbound timeout {}s", config.outbound_timeout().as_secs());

    println!("App definition:");
    let app = match kind.build(&deploy_target(config)) {
        Ok(app) => app,
        Err(e) => {
            println!("  🔴 {e}");
            bail!("{kind} is misconfigured");
        }
    };
    println!("  🟢 manifest {} {}", app.manifest().app_id(), app.manifest().version());
    println!("  🟢 {} routes: {}", app.routes().len(), app.routes().paths().collect::<Vec<_>>().join(", "));

    let bindings = app.bindings_for(&CallRequest::default());
    println!("  🟢 {} binding call paths resolve", collect_call_paths(&bindings).len());

    println!("Permissions:");
    let missing = missing_permissions(app.manifest(), &bindings);
    for (permission, reason) in &missing {
        println!("  🔴 {permission:?} not requested but {reason}");
    }
    if missing.is_empty() {
        println!("  🟢 requested permissions cover the app's calls");
    }

    println!("Lifecycle:");
    let all_good = check_lifecycle(&app);

    println!();
    if all_good && missing.is_empty() {
        println!("✅ All checks passed!");
        Ok(())
    } else {
        bail!("checks failed for {kind}")
    }
}

/// Permissions the app relies on but does not request.
fn missing_permissions(manifest: &Manifest, bindings: &[Binding]) -> Vec<(Permission, &'static str)> {
    let mut missing = Vec::new();
    if !manifest.has_permission(Permission::ActAsBot) {
        missing.push((Permission::ActAsBot, "every app posts as its bot"));
    }
    let wants_user_token = bindings.iter().flat_map(Binding::calls).any(|call| {
        call.expand
            .as_ref()
            .and_then(|e| e.acting_user_access_token)
            .is_some_and(|level| level != ExpandLevel::None)
    });
    if wants_user_token && !manifest.has_permission(Permission::ActAsUser) {
        missing.push((Permission::ActAsUser, "a binding expands the acting user's token"));
    }
    missing
}

fn check_lifecycle(app: &App) -> bool {
    let mut state = LifecycleState::NotInstalled;
    for hook in LIFECYCLE_SEQUENCE {
        state = match state.apply(hook) {
            Ok(next) => next,
            Err(e) => {
                println!("  🔴 {e}");
                return false;
            }
        };
        match app.manifest().hook(hook) {
            Some(call) => println!("  🟢 {hook} → {} (then {state:?})", call.path),
            None => println!("  🟡 {hook} not subscribed (then {state:?})"),
        }
    }
    true
}
