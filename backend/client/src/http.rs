//! HTTP implementation of [`AppActions`] against the host's REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use appbridge_core::{Context, Timer};

use crate::{AppActions, ClientError, ClientFactory, Identity, Result};

/// Applied when no timeout is configured; the dispatcher itself imposes none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DIRECT_CHANNEL_PATH: &str = "/api/v4/channels/direct";
const POSTS_PATH: &str = "/api/v4/posts";
const TIMER_PATH: &str = "/plugins/com.mattermost.apps/api/v1/timer";

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

/// Credentials of one identity, copied out of the call context.
#[derive(Clone)]
struct Credentials {
    identity: Identity,
    site_url: String,
    token: String,
    user_id: String,
}

impl Credentials {
    fn from_context(identity: Identity, ctx: &Context) -> Self {
        let (token, user_id) = match identity {
            Identity::Bot => (ctx.bot_access_token.clone(), ctx.bot_user_id.clone()),
            Identity::ActingUser => (
                ctx.acting_user_access_token.clone(),
                ctx.acting_user_id().to_string(),
            ),
        };
        Self {
            identity,
            site_url: ctx.mattermost_site_url.trim_end_matches('/').to_string(),
            token,
            user_id,
        }
    }
}

pub struct HttpAppClient {
    http: Client,
    creds: Credentials,
}

impl HttpAppClient {
    pub fn new(http: Client, identity: Identity, context: &Context) -> Self {
        Self { http, creds: Credentials::from_context(identity, context) }
    }

    fn url(&self, path: &str) -> Result<String> {
        if self.creds.site_url.is_empty() {
            return Err(ClientError::MissingSiteUrl);
        }
        Ok(format!("{}{}", self.creds.site_url, path))
    }

    fn token(&self) -> Result<&str> {
        if self.creds.token.is_empty() {
            return Err(ClientError::MissingToken { identity: self.creds.identity });
        }
        Ok(&self.creds.token)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(String, String)> {
        let url = self.url(path)?;
        let token = self.token()?;
        debug!(identity = %self.creds.identity, url = %url, "Outbound request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(url = %url, status = status.as_u16(), message = %message, "Host rejected request");
            return Err(ClientError::Status { url, status: status.as_u16(), message });
        }
        Ok((url, text))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let (url, text) = self.post(path, body).await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode { url, message: e.to_string() })
    }
}

/// The host reports failures as `{"message": ...}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl AppActions for HttpAppClient {
    fn identity(&self) -> Identity {
        self.creds.identity
    }

    async fn direct_message(&self, user_id: &str, text: &str) -> Result<String> {
        if self.creds.user_id.is_empty() {
            return Err(ClientError::MissingUserId { identity: self.creds.identity });
        }
        if user_id.is_empty() {
            return Err(ClientError::MissingRecipient);
        }

        let channel: IdOnly = self
            .post_json(DIRECT_CHANNEL_PATH, &[self.creds.user_id.as_str(), user_id])
            .await?;
        let post: IdOnly = self
            .post_json(POSTS_PATH, &json!({ "channel_id": channel.id, "message": text }))
            .await?;
        Ok(post.id)
    }

    async fn create_timer(&self, timer: &Timer) -> Result<()> {
        self.post(TIMER_PATH, timer).await?;
        Ok(())
    }
}

/// Factory sharing one connection pool across every handler invocation.
#[derive(Clone)]
pub struct HttpClientFactory {
    http: Client,
}

impl HttpClientFactory {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(&self, identity: Identity, context: &Context) -> Arc<dyn AppActions> {
        Arc::new(HttpAppClient::new(self.http.clone(), identity, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appbridge_core::{Call, User};
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<(String, String, Value)>>>;

    fn auth(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Minimal fake host bound to an ephemeral port.
    async fn fake_host(seen: Seen) -> String {
        let direct = {
            let seen = seen.clone();
            move |headers: HeaderMap, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push((DIRECT_CHANNEL_PATH.into(), auth(&headers), body));
                Json(serde_json::json!({"id": "dm-channel"}))
            }
        };
        let posts = {
            let seen = seen.clone();
            move |headers: HeaderMap, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push((POSTS_PATH.into(), auth(&headers), body));
                Json(serde_json::json!({"id": "post-1"}))
            }
        };
        let timer = {
            let seen = seen.clone();
            move |headers: HeaderMap, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push((TIMER_PATH.into(), auth(&headers), body));
                StatusCode::OK
            }
        };
        let app = Router::new()
            .route(DIRECT_CHANNEL_PATH, post(direct))
            .route(POSTS_PATH, post(posts))
            .route(TIMER_PATH, post(timer))
            .route(
                "/forbidden/api/v4/channels/direct",
                post(|| async {
                    (StatusCode::FORBIDDEN, Json(serde_json::json!({"message": "permission denied"})))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn context(site: &str) -> Context {
        Context {
            mattermost_site_url: site.to_string(),
            bot_user_id: "bot-id".into(),
            bot_access_token: "bot-token".into(),
            acting_user: Some(User::stub("user-id")),
            acting_user_access_token: "user-token".into(),
            ..Default::default()
        }
    }

    fn factory() -> HttpClientFactory {
        HttpClientFactory::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn bot_direct_message_creates_channel_then_post() {
        let seen: Seen = Default::default();
        let site = fake_host(seen.clone()).await;
        let ctx = context(&site);

        let post_id = factory().as_bot(&ctx).direct_message("user-id", "hello").await.unwrap();
        assert_eq!(post_id, "post-1");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, "Bearer bot-token");
        assert_eq!(seen[0].2, serde_json::json!(["bot-id", "user-id"]));
        assert_eq!(seen[1].2["channel_id"], "dm-channel");
        assert_eq!(seen[1].2["message"], "hello");
    }

    #[tokio::test]
    async fn acting_user_timer_uses_user_token() {
        let seen: Seen = Default::default();
        let site = fake_host(seen.clone()).await;
        let ctx = context(&site);
        let timer = Timer { at: 42, call: Call::new("/timer/execute"), team_id: String::new(), channel_id: String::new() };

        let client = factory().as_acting_user(&ctx);
        assert_eq!(client.identity(), Identity::ActingUser);
        client.create_timer(&timer).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, TIMER_PATH);
        assert_eq!(seen[0].1, "Bearer user-token");
        assert_eq!(seen[0].2["at"], 42);
        assert_eq!(seen[0].2["call"]["path"], "/timer/execute");
    }

    #[tokio::test]
    async fn host_rejection_carries_message() {
        let seen: Seen = Default::default();
        let site = fake_host(seen).await;
        let ctx = context(&format!("{site}/forbidden"));

        let err = factory().as_bot(&ctx).direct_message("user-id", "hi").await.unwrap_err();
        match err {
            ClientError::Status { status, message, .. } => {
                assert_eq!(status, 403);
                assert_eq!(message, "permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let empty = Context::default();
        let err = factory().as_bot(&empty).direct_message("u", "hi").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingUserId { identity: Identity::Bot }));

        let mut no_token = context("http://127.0.0.1:9");
        no_token.acting_user_access_token.clear();
        let timer = Timer { at: 0, call: Call::new("/x"), team_id: String::new(), channel_id: String::new() };
        let err = factory().as_acting_user(&no_token).create_timer(&timer).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken { identity: Identity::ActingUser }));

        let err = factory().as_bot(&context("")).direct_message("u", "hi").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingSiteUrl));
    }
}
