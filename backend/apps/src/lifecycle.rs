//! hello-lifecycle: direct-messages the acting user on every lifecycle event.

use std::sync::Arc;

use async_trait::async_trait;

use appbridge_core::{
    AppError, Call, CallRequest, CallResponse, Expand, ExpandLevel, LifecycleHook, Manifest,
    Permission,
};
use appbridge_dispatch::{App, CallHandler, HandlerEnv};

use crate::{with_icon, DeployTarget, ICON};

pub const APP_ID: &str = "hello-lifecycle";
pub const HOST: &str = "mattermost-apps-golang-lifecycle";
pub const PORT: u16 = 8083;

const CONFIRMATION: &str = "Created a post in your DM channel.";

const HOOKS: [(LifecycleHook, &str, &str); 5] = [
    (LifecycleHook::OnInstall, "/install", "Thanks for installing me!"),
    (LifecycleHook::OnVersionChanged, "/version_changed", "I've been updated!"),
    (LifecycleHook::OnUninstall, "/uninstall", "No, don't uninstall me!"),
    (LifecycleHook::OnEnable, "/enable", "I'm back up again"),
    (LifecycleHook::OnDisable, "/disable", "Taking a little nap"),
];

pub fn manifest(deploy: &DeployTarget) -> Result<Manifest, AppError> {
    let expand = Expand { acting_user: Some(ExpandLevel::Id), ..Default::default() };
    let mut builder = Manifest::builder(APP_ID)
        .version("v1.2.0")
        .display_name("Hello, Lifecycle!")
        .homepage_url("https://github.com/mattermost/mattermost-app-examples/golang/lifecycle")
        .icon(ICON)
        .permission(Permission::ActAsBot);
    for (hook, path, _) in HOOKS {
        builder = builder.hook(hook, Call::new(path).with_expand(expand.clone()));
    }
    deploy.describe(builder, APP_ID).build()
}

pub fn app(deploy: &DeployTarget) -> Result<App, AppError> {
    let mut builder = with_icon(App::builder(manifest(deploy)?));
    for (_, path, message) in HOOKS {
        builder = builder.route(path, Arc::new(NotifyActingUser { message }));
    }
    builder.build()
}

/// Sends a fixed message to the acting user, as the bot.
struct NotifyActingUser {
    message: &'static str,
}

#[async_trait]
impl CallHandler for NotifyActingUser {
    async fn handle(&self, env: &HandlerEnv, request: CallRequest) -> CallResponse {
        let bot = env.clients.as_bot(&request.context);
        match bot.direct_message(request.context.acting_user_id(), self.message).await {
            Ok(_) => CallResponse::text(CONFIRMATION),
            Err(e) => {
                env.outbound_failed(request.path(), &e);
                CallResponse::error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appbridge_client::testing::RecordingClientFactory;
    use appbridge_client::Identity;
    use appbridge_dispatch::{Dispatcher, FixedClock, LifecycleState};
    use chrono::{TimeZone, Utc};

    fn dispatcher(clients: RecordingClientFactory) -> Dispatcher {
        let app = app(&DeployTarget::http("http://localhost:8083")).unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Dispatcher::new(Arc::new(app), Arc::new(clients), Arc::new(clock))
    }

    #[test]
    fn manifest_declares_all_five_hooks() {
        let manifest = manifest(&DeployTarget::http("http://localhost:8083")).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        let decoded: Manifest = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.app_id(), APP_ID);
        assert_eq!(decoded.version(), "v1.2.0");
        assert_eq!(decoded.requested_permissions(), &[Permission::ActAsBot]);
        assert_eq!(decoded.lifecycle_hooks().count(), 5);
        for (_, call) in decoded.lifecycle_hooks() {
            assert_eq!(call.expand.as_ref().and_then(|e| e.acting_user), Some(ExpandLevel::Id));
        }
    }

    #[tokio::test]
    async fn each_hook_messages_the_acting_user() {
        let clients = RecordingClientFactory::new();
        let d = dispatcher(clients.clone());
        let body = br#"{"context":{"acting_user":{"id":"u1"}}}"#;

        let mut state = LifecycleState::NotInstalled;
        let sequence = [
            LifecycleHook::OnInstall,
            LifecycleHook::OnVersionChanged,
            LifecycleHook::OnDisable,
            LifecycleHook::OnEnable,
            LifecycleHook::OnUninstall,
        ];
        for hook in sequence {
            state = state.apply(hook).unwrap();
            let path = d.app().manifest().hook(hook).unwrap().path.clone();
            let response = d.dispatch(&path, body).await.unwrap();
            assert_eq!(response, CallResponse::text(CONFIRMATION));
        }
        assert_eq!(state, LifecycleState::Uninstalled);

        let sent = clients.messages();
        let texts: Vec<_> = sent.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Thanks for installing me!",
                "I've been updated!",
                "Taking a little nap",
                "I'm back up again",
                "No, don't uninstall me!",
            ]
        );
        assert!(sent.iter().all(|m| m.identity == Identity::Bot && m.to_user_id == "u1"));
    }

    #[tokio::test]
    async fn dm_failure_is_an_error_envelope() {
        let d = dispatcher(RecordingClientFactory::new().failing_direct_messages("403 forbidden"));
        let response = d.dispatch("/install", b"{}").await.unwrap();
        assert!(response.is_error());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "error");
    }
}
