use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use detailbook_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        Field {
            key: "line.channel_secret",
            value: redact_secret(config.line.channel_secret.expose_secret()),
            env_keys: &["DETAILBOOK_LINE_CHANNEL_SECRET"],
        },
        Field {
            key: "line.channel_access_token",
            value: redact_secret(config.line.channel_access_token.expose_secret()),
            env_keys: &["DETAILBOOK_LINE_CHANNEL_ACCESS_TOKEN"],
        },
        Field {
            key: "line.api_base_url",
            value: config.line.api_base_url.clone(),
            env_keys: &["DETAILBOOK_LINE_API_BASE_URL"],
        },
        Field {
            key: "line.reply_timeout_secs",
            value: config.line.reply_timeout_secs.to_string(),
            env_keys: &["DETAILBOOK_LINE_REPLY_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["DETAILBOOK_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["DETAILBOOK_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["DETAILBOOK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "catalog.path",
            value: config
                .catalog
                .path
                .as_ref()
                .map_or_else(|| "<built-in>".to_string(), |path| path.display().to_string()),
            env_keys: &["DETAILBOOK_CATALOG_PATH"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["DETAILBOOK_LOGGING_LEVEL", "DETAILBOOK_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["DETAILBOOK_LOGGING_FORMAT", "DETAILBOOK_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(field.key, &field.value, source)
    }));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("detailbook.toml"), PathBuf::from("config/detailbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters so operators can tell credentials apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use super::redact_secret;

    #[test]
    fn redaction_hides_short_secrets_entirely() {
        assert_eq!(redact_secret(""), "<empty>");
        assert_eq!(redact_secret("abc"), "<redacted>");
        assert_eq!(redact_secret("0123456789abcdef"), "***cdef");
    }
}
