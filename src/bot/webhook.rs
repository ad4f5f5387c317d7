//! Webhook endpoint: signature verification, event dispatch, and the single
//! error boundary that turns handler failures into an apology message.
//!
//! The endpoint always answers 200 "OK". The platform retries non-2xx
//! deliveries, and a retried event would re-run side effects that already
//! happened; failures are logged and swallowed instead.

use crate::bot::AppState;
use crate::bot::events::{Event, MessageContent, WebhookRequest};
use crate::messages::{self, Message};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .with_state(state)
}

/// Checks the `x-line-signature` header: HMAC-SHA256 of the raw body under
/// the channel secret, base64-encoded.
fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(provided) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    let signature = headers
        .get("x-line-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.channel_secret, &body, signature) {
        warn!("webhook delivery with a bad signature dropped");
        return "OK";
    }

    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "unparseable webhook body dropped");
            return "OK";
        }
    };

    for event in request.events {
        dispatch(&state, event).await;
    }
    "OK"
}

async fn dispatch(state: &AppState, event: Event) {
    let (source, reply_token) = match &event {
        Event::Follow {
            source,
            reply_token,
        }
        | Event::Message {
            source,
            reply_token,
            ..
        }
        | Event::Postback {
            source,
            reply_token,
            ..
        } => (source, reply_token.clone()),
        Event::Unfollow { source } => {
            if let Some(user_id) = &source.user_id {
                state.dialog.handle_unfollow(user_id);
            }
            return;
        }
        Event::Other => return,
    };

    if source.source_type != "user" {
        reply(state, &reply_token, vec![messages::group_error()]).await;
        return;
    }
    let Some(user_id) = source.user_id.clone() else {
        return;
    };

    let outcome = match event {
        Event::Follow { .. } => state.dialog.handle_follow(&user_id).await,
        Event::Message { message, .. } => match message {
            MessageContent::Text { text } => state.dialog.handle_text(&user_id, &text).await,
            MessageContent::Image { id, image_set } => {
                let set = image_set.as_ref().map(|s| (s.id.as_str(), s.total));
                state.dialog.handle_image(&user_id, &id, set).await
            }
            MessageContent::Other => return,
        },
        Event::Postback { postback, .. } => {
            let date = postback.params.as_ref().and_then(|p| p.date.as_deref());
            state
                .dialog
                .handle_postback(&user_id, &postback.data, date)
                .await
        }
        Event::Unfollow { .. } | Event::Other => return,
    };

    let replies = match outcome {
        Ok(replies) => replies,
        Err(err) => {
            error!(user = user_id, error = %err, "event handler failed");
            vec![messages::unknown_error()]
        }
    };
    if !replies.is_empty() {
        reply(state, &reply_token, replies).await;
    }
}

async fn reply(state: &AppState, reply_token: &str, replies: Vec<Message>) {
    if let Err(err) = state.messaging.reply_message(reply_token, replies).await {
        warn!(error = %err, "reply failed");
    }
}
