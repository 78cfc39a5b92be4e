//! Webhook request body as posted by the LINE platform.
//!
//! Only the fields the bot reads are modelled; unknown fields and event types
//! deserialize without error so one odd event never rejects a whole batch.

use detailbook_core::domain::identity::Identity;
use detailbook_core::flows::GeoLocation;
use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

impl WebhookBody {
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn into_envelopes(self) -> Vec<LineEnvelope> {
        self.events.into_iter().map(WebhookEvent::into_envelope).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub webhook_event_id: Option<String>,
    #[serde(default)]
    pub source: EventSource,
    pub message: Option<MessageContent>,
    pub postback: Option<PostbackContent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub source_type: String,
    pub user_id: Option<String>,
}

impl EventSource {
    pub fn identity(&self) -> Option<Identity> {
        self.user_id.as_deref().filter(|id| !id.trim().is_empty()).map(Identity::new)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Location {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

/// One webhook event, reduced to what the dispatcher routes on.
#[derive(Clone, Debug, PartialEq)]
pub struct LineEnvelope {
    pub webhook_event_id: Option<String>,
    pub reply_token: Option<String>,
    pub source: EventSource,
    pub event: LineEvent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineEvent {
    Text(String),
    Location(GeoLocation),
    Postback(String),
    Follow,
    Unsupported { event_type: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineEventType {
    Message,
    Postback,
    Follow,
    Unsupported,
}

impl LineEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Postback => "postback",
            Self::Follow => "follow",
            Self::Unsupported => "unsupported",
        }
    }
}

impl LineEvent {
    pub fn event_type(&self) -> LineEventType {
        match self {
            Self::Text(_) | Self::Location(_) => LineEventType::Message,
            Self::Postback(_) => LineEventType::Postback,
            Self::Follow => LineEventType::Follow,
            Self::Unsupported { .. } => LineEventType::Unsupported,
        }
    }
}

impl WebhookEvent {
    pub fn into_envelope(self) -> LineEnvelope {
        let event = match (self.event_type.as_str(), self.message, self.postback) {
            ("message", Some(MessageContent::Text { text }), _) => LineEvent::Text(text),
            ("message", Some(MessageContent::Location { title, address, latitude, longitude }), _) => {
                LineEvent::Location(GeoLocation {
                    address: address.or(title),
                    latitude,
                    longitude,
                })
            }
            ("postback", _, Some(postback)) => LineEvent::Postback(postback.data),
            ("follow", _, _) => LineEvent::Follow,
            ("message", _, _) => LineEvent::Unsupported { event_type: "message.other".to_owned() },
            (other, _, _) => LineEvent::Unsupported { event_type: other.to_owned() },
        };

        LineEnvelope {
            webhook_event_id: self.webhook_event_id,
            reply_token: self.reply_token,
            source: self.source,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineEvent, LineEventType, WebhookBody};

    const BODY: &str = r#"{
        "destination": "Ubot",
        "events": [
            {
                "type": "message",
                "replyToken": "r-1",
                "webhookEventId": "ev-1",
                "source": {"type": "user", "userId": "U1"},
                "message": {"type": "text", "id": "m1", "text": "我要預約"}
            },
            {
                "type": "message",
                "replyToken": "r-2",
                "source": {"type": "user", "userId": "U1"},
                "message": {"type": "location", "id": "m2", "title": "公司", "address": "台北市信義區", "latitude": 25.03, "longitude": 121.56}
            },
            {
                "type": "postback",
                "replyToken": "r-3",
                "source": {"type": "user", "userId": "U1"},
                "postback": {"data": "CONFIRM_BOOKING"}
            },
            {
                "type": "message",
                "replyToken": "r-4",
                "source": {"type": "user", "userId": "U1"},
                "message": {"type": "sticker", "id": "m3", "packageId": "1", "stickerId": "2"}
            },
            {"type": "unfollow", "source": {"type": "user", "userId": "U1"}},
            {"type": "follow", "replyToken": "r-5", "source": {"type": "group", "groupId": "G1"}}
        ]
    }"#;

    #[test]
    fn parses_supported_and_unsupported_events() {
        let body = WebhookBody::parse(BODY.as_bytes()).expect("valid body");
        assert_eq!(body.destination, "Ubot");

        let envelopes = body.into_envelopes();
        assert_eq!(envelopes.len(), 6);
        assert_eq!(envelopes[0].event, LineEvent::Text("我要預約".to_owned()));
        assert_eq!(envelopes[0].webhook_event_id.as_deref(), Some("ev-1"));
        assert_eq!(envelopes[0].source.identity().map(|id| id.0), Some("U1".to_owned()));

        let LineEvent::Location(location) = &envelopes[1].event else {
            panic!("location expected");
        };
        assert_eq!(location.describe(), "台北市信義區");

        assert_eq!(envelopes[2].event, LineEvent::Postback("CONFIRM_BOOKING".to_owned()));
        assert_eq!(envelopes[3].event.event_type(), LineEventType::Unsupported);
        assert_eq!(
            envelopes[4].event,
            LineEvent::Unsupported { event_type: "unfollow".to_owned() }
        );
        assert_eq!(envelopes[5].event, LineEvent::Follow);
        assert_eq!(envelopes[5].source.identity(), None);
    }

    #[test]
    fn empty_verification_body_has_no_events() {
        let body = WebhookBody::parse(br#"{"destination":"Ubot","events":[]}"#).expect("valid body");
        assert!(body.into_envelopes().is_empty());
        assert!(WebhookBody::parse(b"not json").is_err());
    }
}
