//! Renders dialog effects as LINE message objects.
//!
//! * prompts become text with quick replies, or flex when they carry detail
//! * the main menu is a flex bubble with one button per command
//! * a completion is a confirmation bubble followed by the menu

use detailbook_core::catalog::Price;
use detailbook_core::domain::booking::Booking;
use detailbook_core::errors::InterfaceError;
use detailbook_core::flows::effects::{SummaryRow, VehicleChoice};
use detailbook_core::flows::{prompts, Effect, Menu, Prompt, PromptDetail, ReplyAction, SuggestedReply};
use serde::Serialize;
use serde_json::{json, Value};

/// Messages per reply call accepted by the platform.
pub const MAX_REPLY_MESSAGES: usize = 5;
pub const MAX_QUICK_REPLY_ITEMS: usize = 13;
const MAX_LABEL_CHARS: usize = 20;
const BRAND_COLOR: &str = "#1DB446";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into(), quick_reply: None }
    }

    /// Text a person reading logs or a terminal would see.
    pub fn preview(&self) -> &str {
        match self {
            Self::Text { text, .. } => text,
            Self::Flex { alt_text, .. } => alt_text,
        }
    }

    pub fn quick_reply(&self) -> Option<&QuickReply> {
        match self {
            Self::Text { quick_reply, .. } | Self::Flex { quick_reply, .. } => quick_reply.as_ref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Message {
        label: String,
        text: String,
    },
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText", skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    Location {
        label: String,
    },
}

impl Action {
    pub fn label(&self) -> &str {
        match self {
            Self::Message { label, .. } | Self::Postback { label, .. } | Self::Location { label } => {
                label
            }
        }
    }
}

impl From<&SuggestedReply> for Action {
    fn from(reply: &SuggestedReply) -> Self {
        let label = clip_label(&reply.label);
        match &reply.action {
            ReplyAction::Message { text } => Self::Message { label, text: text.clone() },
            ReplyAction::Postback { data, display_text } => {
                Self::Postback { label, data: data.clone(), display_text: display_text.clone() }
            }
            ReplyAction::ShareLocation => Self::Location { label },
        }
    }
}

fn clip_label(label: &str) -> String {
    label.chars().take(MAX_LABEL_CHARS).collect()
}

fn quick_reply(replies: &[SuggestedReply]) -> Option<QuickReply> {
    if replies.is_empty() {
        return None;
    }
    let items = replies
        .iter()
        .take(MAX_QUICK_REPLY_ITEMS)
        .map(|reply| QuickReplyItem { item_type: "action", action: Action::from(reply) })
        .collect();
    Some(QuickReply { items })
}

/// Messages for one effect, already capped at [`MAX_REPLY_MESSAGES`].
pub fn render(effect: &Effect) -> Vec<OutboundMessage> {
    let mut messages = match effect {
        Effect::Prompt(prompt) => vec![render_prompt(prompt)],
        Effect::Rejection { reason, retry } => {
            vec![OutboundMessage::text(reason.as_str()), render_prompt(retry)]
        }
        Effect::Completion { booking, price } => {
            let menu = prompts::main_menu(Some(prompts::ANYTHING_ELSE));
            vec![completion(booking, *price), render_menu(&menu)]
        }
        Effect::Menu(menu) => vec![render_menu(menu)],
        Effect::Handoff { notice } => vec![OutboundMessage::text(notice.as_str())],
        Effect::Ignored => Vec::new(),
    };
    messages.truncate(MAX_REPLY_MESSAGES);
    messages
}

/// Generic failure notice followed by the main menu.
pub fn render_failure(error: &InterfaceError) -> Vec<OutboundMessage> {
    vec![OutboundMessage::text(error.user_message()), render_menu(&prompts::main_menu(None))]
}

pub fn render_prompt(prompt: &Prompt) -> OutboundMessage {
    let quick_reply = quick_reply(&prompt.suggested_replies);
    match &prompt.detail {
        None => OutboundMessage::Text { text: prompt.text.clone(), quick_reply },
        Some(PromptDetail::Difference { title, body }) => {
            OutboundMessage::Text { text: format!("{title}\n{body}\n\n{}", prompt.text), quick_reply }
        }
        Some(PromptDetail::VehicleChoices { choices }) => OutboundMessage::Flex {
            alt_text: prompt.text.clone(),
            contents: vehicle_carousel(choices),
            quick_reply,
        },
        Some(PromptDetail::BookingSummary { rows, price }) => OutboundMessage::Flex {
            alt_text: prompt.text.clone(),
            contents: summary_bubble(&prompt.text, rows, *price, confirm_button(prompt)),
            quick_reply,
        },
    }
}

pub fn render_menu(menu: &Menu) -> OutboundMessage {
    let title = menu.notice.as_deref().unwrap_or("請選擇服務：");
    let buttons: Vec<Value> = menu
        .commands
        .iter()
        .map(|command| {
            json!({
                "type": "button",
                "style": "primary",
                "color": BRAND_COLOR,
                "margin": "sm",
                "action": Action::from(command),
            })
        })
        .collect();

    OutboundMessage::Flex {
        alt_text: title.to_owned(),
        contents: json!({
            "type": "bubble",
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    {"type": "text", "text": title, "wrap": true, "weight": "bold"}
                ]
            },
            "footer": {
                "type": "box",
                "layout": "vertical",
                "spacing": "sm",
                "contents": buttons
            }
        }),
        quick_reply: None,
    }
}

fn confirm_button(prompt: &Prompt) -> Option<Value> {
    prompt
        .suggested_replies
        .iter()
        .find(|reply| matches!(reply.action, ReplyAction::Postback { .. }))
        .map(|reply| {
            json!({
                "type": "button",
                "style": "primary",
                "color": BRAND_COLOR,
                "action": Action::from(reply),
            })
        })
}

fn vehicle_carousel(choices: &[VehicleChoice]) -> Value {
    let bubbles: Vec<Value> = choices
        .iter()
        .map(|choice| {
            json!({
                "type": "bubble",
                "size": "micro",
                "body": {
                    "type": "box",
                    "layout": "vertical",
                    "contents": [
                        {"type": "text", "text": choice.label, "weight": "bold", "size": "md"},
                        {"type": "text", "text": choice.example_models, "size": "xs", "color": "#888888", "wrap": true}
                    ]
                },
                "footer": {
                    "type": "box",
                    "layout": "vertical",
                    "contents": [{
                        "type": "button",
                        "style": "primary",
                        "color": BRAND_COLOR,
                        "height": "sm",
                        "action": Action::Message {
                            label: clip_label(&choice.label),
                            text: choice.label.clone(),
                        },
                    }]
                }
            })
        })
        .collect();

    json!({"type": "carousel", "contents": bubbles})
}

fn row_box(row: &SummaryRow) -> Value {
    json!({
        "type": "box",
        "layout": "baseline",
        "spacing": "sm",
        "contents": [
            {"type": "text", "text": row.label, "size": "sm", "color": "#aaaaaa", "flex": 2},
            {"type": "text", "text": row.value, "size": "sm", "wrap": true, "flex": 5}
        ]
    })
}

fn summary_bubble(title: &str, rows: &[SummaryRow], price: Price, button: Option<Value>) -> Value {
    let mut contents = vec![json!({"type": "text", "text": title, "weight": "bold", "size": "lg"})];
    contents.extend(rows.iter().map(row_box));
    contents.push(json!({"type": "separator", "margin": "md"}));
    contents.push(row_box(&SummaryRow { label: "價格".to_owned(), value: format!("${price}") }));

    let mut bubble = json!({
        "type": "bubble",
        "body": {"type": "box", "layout": "vertical", "spacing": "sm", "contents": contents}
    });
    if let Some(button) = button {
        bubble["footer"] = json!({"type": "box", "layout": "vertical", "contents": [button]});
    }
    bubble
}

fn completion(booking: &Booking, price: Price) -> OutboundMessage {
    let title = "預約成功！";
    OutboundMessage::Flex {
        alt_text: format!(
            "{title}{} {} {}",
            booking.selection().display_name(),
            booking.date,
            booking.time_slot.label()
        ),
        contents: summary_bubble(title, &prompts::summary_rows(booking), price, None),
        quick_reply: None,
    }
}
