use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;
use crate::flows::tokens;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// Human-readable form stored as a pickup location.
    pub fn describe(&self) -> String {
        match self.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => address.to_string(),
            _ => format!("{},{}", self.latitude, self.longitude),
        }
    }
}

/// Normalized platform event as handed to the dialog service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub identity: Identity,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn text(identity: Identity, text: impl Into<String>) -> Self {
        Self { identity, kind: EventKind::Text(text.into()) }
    }

    pub fn postback(identity: Identity, data: impl Into<String>) -> Self {
        Self { identity, kind: EventKind::Postback(data.into()) }
    }

    pub fn location(identity: Identity, location: GeoLocation) -> Self {
        Self { identity, kind: EventKind::Location(location) }
    }

    pub fn follow(identity: Identity) -> Self {
        Self { identity, kind: EventKind::Follow }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EventKind {
    Follow,
    Text(String),
    Location(GeoLocation),
    Postback(String),
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Text(_) => "text",
            Self::Location(_) => "location",
            Self::Postback(_) => "postback",
        }
    }

    /// Dialog input carried by the event; follows carry none.
    pub fn into_input(self) -> Option<UserInput> {
        match self {
            Self::Follow => None,
            Self::Text(text) => Some(UserInput::Text(text)),
            Self::Location(location) => Some(UserInput::Location(location)),
            Self::Postback(data) => Some(UserInput::Postback(data)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserInput {
    Text(String),
    Location(GeoLocation),
    Postback(String),
}

impl UserInput {
    pub fn is_back(&self) -> bool {
        matches!(self, Self::Text(text) if tokens::is_back(text))
    }

    pub fn is_submit(&self) -> bool {
        match self {
            Self::Text(text) => text.trim() == tokens::SUBMIT_TEXT,
            Self::Postback(data) => data == tokens::SUBMIT_POSTBACK,
            Self::Location(_) => false,
        }
    }

    /// Sub-service name from a difference-explanation postback.
    pub fn difference_request(&self) -> Option<&str> {
        match self {
            Self::Postback(data) => data.strip_prefix(tokens::DIFFERENCE_POSTBACK_PREFIX),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopLevelCommand {
    StartBooking,
    InquirePrice,
    ChangeBooking,
    RequestHumanAgent,
}

impl TopLevelCommand {
    pub const ALL: [TopLevelCommand; 4] =
        [Self::StartBooking, Self::InquirePrice, Self::ChangeBooking, Self::RequestHumanAgent];

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|command| command.label() == text)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StartBooking => tokens::START_BOOKING,
            Self::InquirePrice => tokens::INQUIRE_PRICE,
            Self::ChangeBooking => tokens::CHANGE_BOOKING,
            Self::RequestHumanAgent => tokens::REQUEST_AGENT,
        }
    }
}
