//! Offline conversation simulator.
//!
//! Each stdin line is one event. Plain lines are text messages; a few slash
//! forms stand in for the other event kinds:
//!
//! ```text
//! /follow
//! /postback CONFIRM_BOOKING
//! /location 25.03 121.56 台北市信義區
//! /quit
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use detailbook_core::audit::InMemoryAuditSink;
use detailbook_core::domain::identity::Identity;
use detailbook_core::flows::{DialogEngine, GeoLocation, InboundEvent};
use detailbook_core::service::DialogService;
use detailbook_core::stores::StoreSet;
use detailbook_line::messages::{self, OutboundMessage};
use serde_json::Value;

use crate::commands::{load_catalog, CommandResult};

pub fn run(input: impl BufRead, user: &str, catalog_path: Option<PathBuf>) -> CommandResult {
    let catalog = match load_catalog(catalog_path) {
        Ok((_, catalog)) => catalog,
        Err(failure) => return failure.into_result("chat"),
    };

    let service = DialogService::new(
        DialogEngine::new(Arc::new(catalog)),
        StoreSet::in_memory(),
        Arc::new(InMemoryAuditSink::default()),
    );
    let identity = Identity::new(user);
    let mut transcript = Vec::new();

    for (turn, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(error) => return CommandResult::failure("chat", "input", error.to_string(), 1),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let event = match parse_line(&identity, line) {
            Ok(event) => event,
            Err(message) => {
                transcript.push(format!("! {message}"));
                continue;
            }
        };

        transcript.push(format!("> {line}"));
        let correlation_id = format!("chat-{}", turn + 1);
        let replies = match service.handle(event, &correlation_id) {
            Ok(effect) => messages::render(&effect),
            Err(error) => messages::render_failure(&error.into_interface(correlation_id)),
        };
        if replies.is_empty() {
            transcript.push("  (no reply)".to_string());
        }
        transcript.extend(replies.iter().map(describe));
    }

    CommandResult { exit_code: 0, output: transcript.join("\n") }
}

fn parse_line(identity: &Identity, line: &str) -> Result<InboundEvent, String> {
    let identity = identity.clone();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(InboundEvent::text(identity, line));
    };

    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "follow" => Ok(InboundEvent::follow(identity)),
        "postback" if !rest.trim().is_empty() => Ok(InboundEvent::postback(identity, rest.trim())),
        "location" => parse_location(rest).map(|location| InboundEvent::location(identity, location)),
        _ => Err(format!("unknown command `/{name}` (try /follow, /postback, /location, /quit)")),
    }
}

fn parse_location(rest: &str) -> Result<GeoLocation, String> {
    let mut parts = rest.split_whitespace();
    let coordinate = |value: Option<&str>| {
        value
            .and_then(|value| value.parse::<f64>().ok())
            .ok_or_else(|| "usage: /location <lat> <lon> [address]".to_string())
    };
    let latitude = coordinate(parts.next())?;
    let longitude = coordinate(parts.next())?;
    let address = parts.collect::<Vec<_>>().join(" ");

    Ok(GeoLocation {
        address: (!address.is_empty()).then_some(address),
        latitude,
        longitude,
    })
}

/// One message as terminal text, followed by the choices it offers.
fn describe(message: &OutboundMessage) -> String {
    let mut text = format!("< {}", message.preview().replace('\n', "\n  "));

    let mut choices = Vec::new();
    if let OutboundMessage::Flex { contents, .. } = message {
        collect_button_labels(contents, &mut choices);
    }
    if let Some(quick_reply) = message.quick_reply() {
        choices.extend(quick_reply.items.iter().map(|item| item.action.label().to_string()));
    }
    if !choices.is_empty() {
        let rendered: Vec<String> = choices.iter().map(|label| format!("[{label}]")).collect();
        text.push_str(&format!("\n  {}", rendered.join(" ")));
    }
    text
}

fn collect_button_labels(value: &Value, labels: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("button") {
                if let Some(label) = value.pointer("/action/label").and_then(Value::as_str) {
                    labels.push(label.to_string());
                }
                return;
            }
            map.values().for_each(|child| collect_button_labels(child, labels));
        }
        Value::Array(items) => items.iter().for_each(|child| collect_button_labels(child, labels)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use detailbook_core::domain::identity::Identity;
    use detailbook_core::flows::EventKind;

    use super::parse_line;

    #[test]
    fn slash_forms_map_to_event_kinds() {
        let identity = Identity::new("U1");

        let event = parse_line(&identity, "/postback CONFIRM_BOOKING").expect("postback");
        assert_eq!(event.kind, EventKind::Postback("CONFIRM_BOOKING".to_string()));

        let event = parse_line(&identity, "/location 25.03 121.56 台北市 信義區").expect("location");
        let EventKind::Location(location) = event.kind else {
            panic!("expected location event");
        };
        assert_eq!(location.address.as_deref(), Some("台北市 信義區"));

        assert!(parse_line(&identity, "/location north").is_err());
        assert!(parse_line(&identity, "/teleport").is_err());
        assert_eq!(
            parse_line(&identity, "我要預約").expect("text").kind,
            EventKind::Text("我要預約".to_string())
        );
    }
}
