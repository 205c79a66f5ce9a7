//! hello-timer: `/timer <duration>` schedules a direct message from the bot.
//!
//! Creating the timer runs as the acting user; the host later fires
//! `/timer/execute`, which runs as the bot and only knows the acting user id.

use appbridge_core::{
    AppError, Binding, Call, CallRequest, CallResponse, Expand, ExpandLevel, Field, FieldType,
    Form, Location, Manifest, Permission, TextSubtype, Timer,
};
use appbridge_dispatch::{handler_fn, App, HandlerEnv};
use tracing::warn;

use crate::{with_icon, DeployTarget, ICON};

pub const APP_ID: &str = "hello-timer";
pub const HOST: &str = "mattermost-apps-golang-timers";
pub const PORT: u16 = 8085;

pub const CREATE_PATH: &str = "/timer/create";
pub const EXECUTE_PATH: &str = "/timer/execute";

const DURATION: &str = "duration";

pub fn manifest(deploy: &DeployTarget) -> Result<Manifest, AppError> {
    let builder = Manifest::builder(APP_ID)
        .version("v1.1.0")
        .display_name("Hello, timers!")
        .homepage_url("https://github.com/mattermost/mattermost-app-examples/golang/timers")
        .icon(ICON)
        .permission(Permission::ActAsBot)
        .permission(Permission::ActAsUser)
        .location(Location::Command);
    deploy.describe(builder, APP_ID).build()
}

pub fn bindings() -> Vec<Binding> {
    let mut duration = Field::new(DURATION, FieldType::Text);
    duration.label = DURATION.to_string();
    duration.description = "duration until the timer expires in seconds".to_string();
    duration.is_required = true;
    duration.position = 1;
    duration.subtype = Some(TextSubtype::Number);

    let submit = Call::new(CREATE_PATH).with_expand(Expand {
        acting_user_access_token: Some(ExpandLevel::All),
        channel: Some(ExpandLevel::Id),
        team: Some(ExpandLevel::Id),
        ..Default::default()
    });

    let timer = Binding {
        icon: ICON.to_string(),
        label: "timer".to_string(),
        description: "Create a timer".to_string(),
        form: Some(Form { submit: Some(submit), fields: vec![duration], ..Default::default() }),
        ..Default::default()
    };
    vec![Binding::at(Location::Command.as_str(), vec![timer])]
}

pub fn app(deploy: &DeployTarget) -> Result<App, AppError> {
    with_icon(App::builder(manifest(deploy)?))
        .bindings(|_| bindings())
        .route(CREATE_PATH, handler_fn(create_timer))
        .route(EXECUTE_PATH, handler_fn(execute_timer))
        .build()
}

/// Schedule `/timer/execute` `duration` seconds from now.
///
/// `duration` follows the permissive integer policy, so a non-numeric value
/// schedules the timer for right now.
async fn create_timer(env: HandlerEnv, request: CallRequest) -> CallResponse {
    let seconds = request.value_as_int(DURATION);
    let fire = Call::new(EXECUTE_PATH)
        .with_expand(Expand { acting_user: Some(ExpandLevel::Id), ..Default::default() });

    let timer = match Timer::after(env.clock.now(), seconds, fire) {
        Ok(timer) => timer.in_channel(request.context.team_id(), request.context.channel_id()),
        Err(e) => return CallResponse::error(e),
    };

    let user = env.clients.as_acting_user(&request.context);
    if let Err(e) = user.create_timer(&timer).await {
        env.outbound_failed(request.path(), &e);
        return CallResponse::error(e);
    }

    let at = timer.fire_time().map(|t| t.to_string()).unwrap_or_default();
    CallResponse::text(format!("Successfully set a timer to `{at}`."))
}

/// Timer fire. The host may deliver it more than once; each delivery sends
/// one message and nothing else is touched. A failed message is logged and
/// the fire still answers with an empty text response.
async fn execute_timer(env: HandlerEnv, request: CallRequest) -> CallResponse {
    let bot = env.clients.as_bot(&request.context);
    if let Err(e) = bot.direct_message(request.context.acting_user_id(), "Received timer").await {
        warn!(path = %request.path(), "Timer fire could not notify the acting user");
        env.outbound_failed(request.path(), &e);
    }
    CallResponse::text("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use appbridge_client::testing::RecordingClientFactory;
    use appbridge_client::Identity;
    use appbridge_dispatch::{Dispatcher, FixedClock};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn dispatcher(clients: RecordingClientFactory) -> Dispatcher {
        let app = app(&DeployTarget::http("http://localhost:8085")).unwrap();
        Dispatcher::new(Arc::new(app), Arc::new(clients), Arc::new(FixedClock(now())))
    }

    fn create_body(duration: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "path": CREATE_PATH,
            "values": {"duration": duration},
            "context": {
                "acting_user": {"id": "u1"},
                "acting_user_access_token": "user-token",
                "channel": {"id": "c1", "team_id": "t1"},
            },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn creates_timer_ten_seconds_out() {
        let clients = RecordingClientFactory::new();
        let response = dispatcher(clients.clone())
            .dispatch(CREATE_PATH, &create_body("10"))
            .await
            .unwrap();

        let timers = clients.timers();
        assert_eq!(timers.len(), 1);
        let created = &timers[0];
        assert_eq!(created.identity, Identity::ActingUser);
        assert_eq!(created.timer.at, now().timestamp_millis() + 10_000);
        assert_eq!(created.timer.call.path, EXECUTE_PATH);
        assert_eq!(
            created.timer.call.expand.as_ref().and_then(|e| e.acting_user),
            Some(ExpandLevel::Id)
        );
        assert_eq!(created.timer.channel_id, "c1");
        assert_eq!(created.timer.team_id, "t1");
        assert_eq!(
            response,
            CallResponse::text("Successfully set a timer to `2024-05-01 12:00:10 UTC`.")
        );
    }

    #[tokio::test]
    async fn non_numeric_duration_fires_now() {
        let clients = RecordingClientFactory::new();
        dispatcher(clients.clone()).dispatch(CREATE_PATH, &create_body("abc")).await.unwrap();
        assert_eq!(clients.timers()[0].timer.at, now().timestamp_millis());
    }

    #[tokio::test]
    async fn timer_failure_is_an_error_envelope() {
        let clients = RecordingClientFactory::new().failing_timers("host unreachable");
        let response = dispatcher(clients.clone())
            .dispatch(CREATE_PATH, &create_body("10"))
            .await
            .unwrap();
        assert!(response.is_error());
        assert!(clients.timers().is_empty());
    }

    #[tokio::test]
    async fn fire_is_context_free_and_repeatable() {
        let clients = RecordingClientFactory::new();
        let d = dispatcher(clients.clone());
        let body = br#"{"path":"/timer/execute","context":{"acting_user":{"id":"u1"}}}"#;

        for _ in 0..2 {
            let response = d.dispatch(EXECUTE_PATH, body).await.unwrap();
            assert_eq!(response, CallResponse::text(""));
        }
        let sent = clients.messages();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|m| m.identity == Identity::Bot && m.to_user_id == "u1" && m.text == "Received timer"));
    }

    #[tokio::test]
    async fn failed_fire_is_swallowed() {
        let clients = RecordingClientFactory::new().failing_direct_messages("403");
        let response = dispatcher(clients).dispatch(EXECUTE_PATH, b"").await.unwrap();
        assert_eq!(response, CallResponse::text(""));
    }

    #[test]
    fn command_binding_shape() {
        let value = serde_json::to_value(bindings()).unwrap();
        let timer = &value[0]["bindings"][0];
        assert_eq!(value[0]["location"], "/command");
        assert_eq!(timer["label"], "timer");
        assert_eq!(timer["form"]["submit"]["path"], CREATE_PATH);
        assert_eq!(timer["form"]["submit"]["expand"]["acting_user_access_token"], "all");
        assert_eq!(timer["form"]["fields"][0]["subtype"], "number");
        assert_eq!(timer["form"]["fields"][0]["position"], 1);
    }
}
