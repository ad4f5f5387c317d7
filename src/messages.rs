//! Outgoing message catalog.
//!
//! Every message the bot can send is built here, so the dialog and worker
//! logic stay free of presentation JSON. [`Message`] serializes directly to
//! the platform's message object shapes.

use crate::core::postback::{PostbackAction, PostbackPayload};
use crate::entities::{
    ClassificationModel, DraftModel, DraftStatus, PaymentMethod, UserModel,
};
use serde::Serialize;
use serde_json::{Value, json};

/// One outgoing platform message.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<Value>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
    },
}

impl Message {
    fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            quick_reply: None,
        }
    }
}

fn postback_action(label: &str, payload: &PostbackPayload) -> Value {
    json!({
        "type": "postback",
        "label": label,
        "data": payload.encode(),
        "displayText": label,
    })
}

fn button(action: Value) -> Value {
    json!({
        "type": "button",
        "style": "secondary",
        "height": "sm",
        "action": action,
    })
}

fn bubble(body_text: &str, footer_buttons: Vec<Value>) -> Value {
    json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": [
                { "type": "text", "text": body_text, "wrap": true, "size": "sm" }
            ],
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": footer_buttons,
        },
    })
}

pub fn greeting(display_name: &str) -> Message {
    Message::text(format!(
        "Thanks for adding me, {display_name}! Send me a photo of a receipt \
         and I will draft a household-ledger entry from it.\n\nFirst, say \
         \"register user\" so I know what name to put on the ledger."
    ))
}

pub fn group_error() -> Message {
    Message::text("I only work in one-on-one chats. Please message me directly.")
}

pub fn not_understood() -> Message {
    Message::text(
        "Sorry, I did not understand that. Send a receipt photo, or say \
         \"pending receipts\" to see what is still open.",
    )
}

pub fn unknown_error() -> Message {
    Message::text("Something went wrong on my side. Please try again in a moment.")
}

/// Fixed small-talk responses. Anything not listed falls through to
/// [`not_understood`].
pub fn canned_response(text: &str) -> Option<Message> {
    let reply = match text {
        "hello" | "hi" => "Hello! Send me a receipt photo whenever you are ready.",
        "thanks" | "thank you" => "You are welcome!",
        "help" => {
            "Send a receipt photo and I will draft a ledger entry.\n\
             Say \"pending receipts\" to list open drafts.\n\
             Say \"register user\" to set your name."
        }
        _ => return None,
    };
    Some(Message::text(reply))
}

pub fn prompt_user_name() -> Message {
    Message::text("What name should I record you under? Reply with just the name.")
}

pub fn register_user_done(name: &str) -> Message {
    Message::text(format!("Done. I will record you as \"{name}\" from now on."))
}

pub fn expenditure_cancelled() -> Message {
    Message::text("Cancelled the pending entry.")
}

pub fn prompt_receipt_photo(minor: &str) -> Message {
    Message::text(format!(
        "Got it, a \"{minor}\" expense. Now send me the receipt photo."
    ))
}

/// Immediate acknowledgement that analysis started, with a shortcut to poll
/// the result.
pub fn analysis_started(draft_id: &str) -> Message {
    let detail = PostbackPayload::new(PostbackAction::ShowDetail, draft_id);
    Message::Text {
        text: "Analyzing your receipt. I will let you know when it is done.".to_string(),
        quick_reply: Some(json!({
            "items": [{
                "type": "action",
                "action": postback_action("Check progress", &detail),
            }],
        })),
    }
}

pub fn analysis_complete(draft_id: &str, num_receipts: usize) -> Message {
    let detail = PostbackPayload::new(PostbackAction::ShowDetail, draft_id);
    let mut text = "Your receipt is ready for review.".to_string();
    if num_receipts > 1 {
        text.push_str(&format!(
            "\nI found {num_receipts} receipts; each one became its own entry. \
             Say \"pending receipts\" to review the others."
        ));
    }
    Message::Text {
        text,
        quick_reply: Some(json!({
            "items": [{
                "type": "action",
                "action": postback_action("Review", &detail),
            }],
        })),
    }
}

pub fn analysis_failed(draft_id: &str) -> Message {
    let detail = PostbackPayload::new(PostbackAction::ShowDetail, draft_id);
    Message::Text {
        text: "I could not read a receipt in that image. Please try a clearer photo."
            .to_string(),
        quick_reply: Some(json!({
            "items": [{
                "type": "action",
                "action": postback_action("Details", &detail),
            }],
        })),
    }
}

pub fn not_found() -> Message {
    Message::text("That entry no longer exists. It may have expired or already been registered.")
}

pub fn registered() -> Message {
    Message::text("Registered to the household ledger.")
}

pub fn discarded() -> Message {
    Message::text("Discarded the entry.")
}

pub fn no_registered_users() -> Message {
    Message::text("Nobody has registered a name yet. Say \"register user\" first.")
}

/// The main confirmation view for a draft, rendered from its current status.
pub fn confirm_view(draft: &DraftModel) -> Message {
    match draft.status {
        DraftStatus::New | DraftStatus::Analyzing => {
            let detail = PostbackPayload::new(PostbackAction::ShowDetail, &draft.id);
            Message::Text {
                text: "Still analyzing this receipt. Check again in a moment.".to_string(),
                quick_reply: Some(json!({
                    "items": [{
                        "type": "action",
                        "action": postback_action("Check again", &detail),
                    }],
                })),
            }
        }
        DraftStatus::InvalidImage => {
            let discard = PostbackPayload::new(PostbackAction::Discard, &draft.id);
            Message::Flex {
                alt_text: "Image could not be read".to_string(),
                contents: bubble(
                    "This image could not be read as a receipt. It will be \
                     dropped automatically within a day, or you can discard it now.",
                    vec![button(postback_action("Discard", &discard))],
                ),
            }
        }
        DraftStatus::Analyzed => analyzed_view(draft),
    }
}

fn analyzed_view(draft: &DraftModel) -> Message {
    let id = &draft.id;
    let body = format!("{}\n\n{}", draft.data.receipt_info(), draft.data.common_info());

    let mut buttons = Vec::new();
    if !draft.data.items.is_empty() {
        buttons.push(button(postback_action(
            "Register",
            &PostbackPayload::new(PostbackAction::RegisterExpenditure, id),
        )));
    }
    if draft.data.total.is_some() {
        buttons.push(button(postback_action(
            "Register total only",
            &PostbackPayload::new(PostbackAction::RegisterOnlyTotal, id),
        )));
    }
    buttons.push(button(postback_action(
        "Change category",
        &PostbackPayload::new(PostbackAction::ChangeClassification, id),
    )));
    buttons.push(button(postback_action(
        "Change payer",
        &PostbackPayload::new(PostbackAction::ChangePayer, id),
    )));
    buttons.push(button(postback_action(
        "Change who it is for",
        &PostbackPayload::new(PostbackAction::ChangeForWhom, id),
    )));
    buttons.push(button(postback_action(
        "Change payment method",
        &PostbackPayload::new(PostbackAction::ChangePaymentMethod, id),
    )));
    buttons.push(button(json!({
        "type": "datetimepicker",
        "label": "Change date",
        "data": PostbackPayload::new(PostbackAction::UpdateDate, id).encode(),
        "mode": "date",
    })));
    buttons.push(button(postback_action(
        "Discard",
        &PostbackPayload::new(PostbackAction::Discard, id),
    )));

    Message::Flex {
        alt_text: format!("Receipt from {}", draft.data.store),
        contents: bubble(&body, buttons),
    }
}

/// Carousel of the user's open drafts, one card per draft.
pub fn pending_list(drafts: &[DraftModel]) -> Message {
    if drafts.is_empty() {
        return Message::text("No pending receipts.");
    }
    let bubbles: Vec<Value> = drafts
        .iter()
        .map(|draft| {
            let detail = PostbackPayload::new(PostbackAction::ShowDetail, &draft.id);
            let summary = match draft.status {
                DraftStatus::New => "Waiting for a photo".to_string(),
                DraftStatus::Analyzing => "Analyzing".to_string(),
                DraftStatus::InvalidImage => "Image could not be read".to_string(),
                DraftStatus::Analyzed => format!(
                    "{} / {} yen",
                    if draft.data.store.is_empty() {
                        "unknown store"
                    } else {
                        &draft.data.store
                    },
                    draft
                        .data
                        .total
                        .map_or_else(|| "?".to_string(), |t| t.to_string()),
                ),
            };
            bubble(&summary, vec![button(postback_action("Open", &detail))])
        })
        .collect();
    Message::Flex {
        alt_text: format!("{} pending receipts", drafts.len()),
        contents: json!({ "type": "carousel", "contents": bubbles }),
    }
}

/// Category picker, one bubble per major category with its minors as
/// color-coded buttons.
pub fn classification_picker(
    draft_id: &str,
    groups: &[(String, Vec<ClassificationModel>)],
) -> Message {
    let bubbles: Vec<Value> = groups
        .iter()
        .map(|(major, members)| {
            let buttons: Vec<Value> = members
                .iter()
                .map(|c| {
                    let payload = PostbackPayload::with_item(
                        PostbackAction::UpdateClassification,
                        draft_id,
                        &c.minor,
                    );
                    json!({
                        "type": "button",
                        "style": "primary",
                        "height": "sm",
                        "color": c.color,
                        "action": postback_action(&c.minor, &payload),
                    })
                })
                .collect();
            bubble(&format!("Category: {major}"), buttons)
        })
        .collect();
    Message::Flex {
        alt_text: "Pick a category".to_string(),
        contents: json!({ "type": "carousel", "contents": bubbles }),
    }
}

/// Picker for who the expense is for: every registered user plus "shared".
pub fn for_whom_picker(draft_id: &str, users: &[UserModel]) -> Message {
    let mut buttons: Vec<Value> = users
        .iter()
        .map(|user| {
            let payload =
                PostbackPayload::with_item(PostbackAction::UpdateForWhom, draft_id, &user.name);
            button(postback_action(&user.name, &payload))
        })
        .collect();
    let shared = PostbackPayload::with_item(PostbackAction::UpdateForWhom, draft_id, "shared");
    buttons.push(button(postback_action("shared", &shared)));
    Message::Flex {
        alt_text: "Who is this for?".to_string(),
        contents: bubble("Who is this expense for?", buttons),
    }
}

/// Payer picker over the registered users.
pub fn payer_picker(draft_id: &str, users: &[UserModel]) -> Message {
    if users.is_empty() {
        return no_registered_users();
    }
    let buttons: Vec<Value> = users
        .iter()
        .map(|user| {
            let payload =
                PostbackPayload::with_item(PostbackAction::UpdatePayer, draft_id, &user.name);
            button(postback_action(&user.name, &payload))
        })
        .collect();
    Message::Flex {
        alt_text: "Who paid?".to_string(),
        contents: bubble("Who paid?", buttons),
    }
}

pub fn payment_method_picker(draft_id: &str) -> Message {
    let buttons: Vec<Value> = [PaymentMethod::AdvancePayment, PaymentMethod::FamilyCard]
        .into_iter()
        .map(|method| {
            let payload = PostbackPayload::with_item(
                PostbackAction::UpdatePaymentMethod,
                draft_id,
                method.key(),
            );
            button(postback_action(method.label(), &payload))
        })
        .collect();
    Message::Flex {
        alt_text: "How was this paid?".to_string(),
        contents: bubble("How was this paid?", buttons),
    }
}
