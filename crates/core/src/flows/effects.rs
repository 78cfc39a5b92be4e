use serde::{Deserialize, Serialize};

use crate::catalog::Price;
use crate::domain::booking::Booking;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyAction {
    Message { text: String },
    Postback { data: String, display_text: Option<String> },
    ShareLocation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedReply {
    pub label: String,
    pub action: ReplyAction,
}

impl SuggestedReply {
    /// A reply that sends its own label back as text.
    pub fn echo(label: impl Into<String>) -> Self {
        let label = label.into();
        Self { action: ReplyAction::Message { text: label.clone() }, label }
    }

    pub fn message(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self { label: label.into(), action: ReplyAction::Message { text: text.into() } }
    }

    pub fn postback(
        label: impl Into<String>,
        data: impl Into<String>,
        display_text: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            action: ReplyAction::Postback { data: data.into(), display_text },
        }
    }

    pub fn share_location(label: impl Into<String>) -> Self {
        Self { label: label.into(), action: ReplyAction::ShareLocation }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleChoice {
    pub label: String,
    pub example_models: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

/// Structured content a renderer may show richer than plain text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptDetail {
    VehicleChoices { choices: Vec<VehicleChoice> },
    BookingSummary { rows: Vec<SummaryRow>, price: Price },
    Difference { title: String, body: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub suggested_replies: Vec<SuggestedReply>,
    pub expects_location: bool,
    pub detail: Option<PromptDetail>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_replies: Vec::new(),
            expects_location: false,
            detail: None,
        }
    }

    pub fn with_reply(mut self, reply: SuggestedReply) -> Self {
        self.suggested_replies.push(reply);
        self
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = SuggestedReply>) -> Self {
        self.suggested_replies.extend(replies);
        self
    }

    pub fn with_detail(mut self, detail: PromptDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn expecting_location(mut self) -> Self {
        self.expects_location = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub notice: Option<String>,
    pub commands: Vec<SuggestedReply>,
}

/// What the user should see after one dialog turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Prompt(Prompt),
    Rejection { reason: String, retry: Prompt },
    Completion { booking: Booking, price: Price },
    Menu(Menu),
    Handoff { notice: String },
    Ignored,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt",
            Self::Rejection { .. } => "rejection",
            Self::Completion { .. } => "completion",
            Self::Menu(_) => "menu",
            Self::Handoff { .. } => "handoff",
            Self::Ignored => "ignored",
        }
    }
}
