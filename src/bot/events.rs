//! Incoming webhook event types.
//!
//! Only the event and message kinds the bot reacts to are modelled; anything
//! else deserializes into the `Other` variants and is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Follow {
        source: Source,
        #[serde(rename = "replyToken")]
        reply_token: String,
    },
    Unfollow {
        source: Source,
    },
    Message {
        source: Source,
        #[serde(rename = "replyToken")]
        reply_token: String,
        message: MessageContent,
    },
    Postback {
        source: Source,
        #[serde(rename = "replyToken")]
        reply_token: String,
        postback: PostbackContent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        id: String,
        #[serde(rename = "imageSet", default)]
        image_set: Option<ImageSet>,
    },
    #[serde(other)]
    Other,
}

/// Present on image messages sent as one multi-image submission. The image
/// count is not guaranteed on every event of a set.
#[derive(Debug, Deserialize)]
pub struct ImageSet {
    pub id: String,
    #[serde(default)]
    pub total: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PostbackContent {
    pub data: String,
    #[serde(default)]
    pub params: Option<PostbackParams>,
}

#[derive(Debug, Deserialize)]
pub struct PostbackParams {
    #[serde(default)]
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_text_message_event() {
        let raw = r#"{
            "events": [{
                "type": "message",
                "replyToken": "token1",
                "source": { "type": "user", "userId": "user1" },
                "message": { "type": "text", "id": "m1", "text": "hello" }
            }]
        }"#;
        let request: WebhookRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.events.len(), 1);
        let Event::Message { source, message, .. } = &request.events[0] else {
            panic!("expected a message event");
        };
        assert_eq!(source.user_id.as_deref(), Some("user1"));
        assert!(matches!(message, MessageContent::Text { text } if text == "hello"));
    }

    #[test]
    fn test_parse_batched_image_event() {
        let raw = r#"{
            "type": "message",
            "replyToken": "token1",
            "source": { "type": "user", "userId": "user1" },
            "message": {
                "type": "image",
                "id": "img1",
                "imageSet": { "id": "set1", "index": 1, "total": 3 }
            }
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        let Event::Message {
            message: MessageContent::Image { id, image_set },
            ..
        } = event
        else {
            panic!("expected an image event");
        };
        assert_eq!(id, "img1");
        let set = image_set.unwrap();
        assert_eq!(set.id, "set1");
        assert_eq!(set.total, Some(3));
    }

    #[test]
    fn test_parse_image_set_without_total() {
        let raw = r#"{
            "type": "message",
            "replyToken": "token1",
            "source": { "type": "user", "userId": "user1" },
            "message": {
                "type": "image",
                "id": "img1",
                "imageSet": { "id": "set1" }
            }
        }"#;
        let Event::Message {
            message: MessageContent::Image { image_set, .. },
            ..
        } = serde_json::from_str(raw).unwrap()
        else {
            panic!("expected an image event");
        };
        assert_eq!(image_set.unwrap().total, None);
    }

    #[test]
    fn test_unknown_event_types_are_tolerated() {
        let raw = r#"{
            "events": [
                { "type": "memberJoined", "replyToken": "t", "joined": {} },
                { "type": "unfollow", "source": { "type": "user", "userId": "user1" } }
            ]
        }"#;
        let request: WebhookRequest = serde_json::from_str(raw).unwrap();
        assert!(matches!(request.events[0], Event::Other));
        assert!(matches!(request.events[1], Event::Unfollow { .. }));
    }

    #[test]
    fn test_parse_postback_with_date_param() {
        let raw = r#"{
            "type": "postback",
            "replyToken": "token1",
            "source": { "type": "user", "userId": "user1" },
            "postback": { "data": "{}", "params": { "date": "2026-08-01" } }
        }"#;
        let Event::Postback { postback, .. } = serde_json::from_str(raw).unwrap() else {
            panic!("expected a postback event");
        };
        assert_eq!(
            postback.params.and_then(|p| p.date).as_deref(),
            Some("2026-08-01")
        );
    }
}
