//! dynamic-hello-world: a form that grows a second question once the first
//! one is answered.

use appbridge_core::{
    AppError, Binding, Call, CallRequest, CallResponse, Expand, ExpandLevel, Field, FieldType,
    Form, LifecycleHook, Location, Manifest, Permission, SelectOption,
};
use appbridge_dispatch::{handler_fn, App, HandlerEnv};
use serde_json::json;
use tracing::debug;

use crate::{with_icon, DeployTarget, ICON};

pub const APP_ID: &str = "dynamic-hello-world";
pub const HOST: &str = "mattermost-apps-python-hello-world";
pub const PORT: u16 = 8090;

const FIRST_CHOICE: &str = "choice_1";
const SECOND_CHOICE: &str = "choice_2";

fn app_and_user() -> Expand {
    Expand {
        app: Some(ExpandLevel::All),
        acting_user: Some(ExpandLevel::All),
        ..Default::default()
    }
}

pub fn manifest(deploy: &DeployTarget) -> Result<Manifest, AppError> {
    let builder = Manifest::builder(APP_ID)
        .display_name("Hello world app in a Dynamic Form")
        .homepage_url(
            "https://github.com/mattermost/mattermost-app-examples/tree/master/python/dynamic-hello-world",
        )
        .icon(ICON)
        .permission(Permission::ActAsBot)
        .location(Location::ChannelHeader)
        .location(Location::Command)
        .hook(
            LifecycleHook::OnInstall,
            Call::new("/install")
                .with_expand(Expand { app: Some(ExpandLevel::All), ..Default::default() }),
        )
        .bindings_call(Call::new("/bindings"));
    deploy.describe(builder, APP_ID).build()
}

/// The form as first shown: one dynamic select, refreshed on change.
pub fn dynamic_form() -> Form {
    let mut first = Field::new(FIRST_CHOICE, FieldType::DynamicSelect);
    first.modal_label = "What is 1 + 1?".to_string();
    first.is_required = true;
    first.refresh = true;
    first.hint = "The answer is 2.".to_string();
    first.lookup = Some(Call::new("/lookup"));

    Form {
        title: "I am a Dynamic form!".to_string(),
        icon: ICON.to_string(),
        source: Some(Call::new("/dynamic_source").with_expand(app_and_user())),
        submit: Some(Call::new("/submit").with_expand(app_and_user())),
        fields: vec![first],
        ..Default::default()
    }
}

fn first_answers() -> Vec<SelectOption> {
    (0..10).map(|i| SelectOption::new(i.to_string(), i.to_string())).collect()
}

fn second_question() -> Field {
    let mut second = Field::new(SECOND_CHOICE, FieldType::StaticSelect);
    second.modal_label = "What is 10 + 10?".to_string();
    second.is_required = true;
    second.hint = "The answer is 20.".to_string();
    second.options = (10..=20).map(|i| SelectOption::new(i.to_string(), i.to_string())).collect();
    second
}

pub fn bindings() -> Vec<Binding> {
    let send = Binding {
        location: "send-button".to_string(),
        icon: ICON.to_string(),
        label: "send hello message".to_string(),
        form: Some(dynamic_form()),
        ..Default::default()
    };
    vec![Binding::at(Location::ChannelHeader.as_str(), vec![send])]
}

pub fn app(deploy: &DeployTarget) -> Result<App, AppError> {
    with_icon(App::builder(manifest(deploy)?))
        .bindings(|_| bindings())
        .route("/install", handler_fn(install))
        .route("/lookup", handler_fn(lookup))
        .route("/dynamic_source", handler_fn(dynamic_source))
        .route("/submit", handler_fn(submit))
        .route("/ping", handler_fn(ping))
        .build()
}

async fn install(_env: HandlerEnv, request: CallRequest) -> CallResponse {
    debug!(acting_user_id = %request.context.acting_user_id(), "Installed");
    CallResponse::data(json!({}))
}

/// Options for the first question.
async fn lookup(_env: HandlerEnv, _request: CallRequest) -> CallResponse {
    CallResponse::data(json!({ "items": first_answers() }))
}

/// Form source: called when the form opens and whenever a refreshing field
/// changes.
async fn dynamic_source(_env: HandlerEnv, request: CallRequest) -> CallResponse {
    match request.selected_field.as_str() {
        "" => CallResponse::form(dynamic_form()),
        FIRST_CHOICE => {
            let mut form = dynamic_form();
            if let Some(field) = form.field_mut(FIRST_CHOICE) {
                field.value = request.value(FIRST_CHOICE).cloned();
            }
            form.fields.push(second_question());
            CallResponse::form(form)
        }
        _ => CallResponse::error("Something went wrong."),
    }
}

async fn submit(_env: HandlerEnv, request: CallRequest) -> CallResponse {
    debug!(values = ?request.values, "Dynamic form submitted");
    CallResponse::text(
        "This was an example of a dynamic form. The form was refreshed with new options.",
    )
}

async fn ping(_env: HandlerEnv, _request: CallRequest) -> CallResponse {
    debug!("ping...");
    CallResponse::text("")
}
