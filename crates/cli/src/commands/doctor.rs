use detailbook_core::catalog::ServiceCatalog;
use detailbook_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_line_credentials(&config));
            checks.push(check_catalog(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "line_credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "service_catalog",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_line_credentials(config: &AppConfig) -> DoctorCheck {
    let mut missing = Vec::new();
    if config.line.channel_secret.expose_secret().trim().is_empty() {
        missing.push("line.channel_secret");
    }
    if config.line.channel_access_token.expose_secret().trim().is_empty() {
        missing.push("line.channel_access_token");
    }

    if missing.is_empty() {
        DoctorCheck {
            name: "line_credentials",
            status: CheckStatus::Pass,
            details: "channel secret and access token are set".to_string(),
        }
    } else {
        DoctorCheck {
            name: "line_credentials",
            status: CheckStatus::Fail,
            details: format!("missing {}; the server will refuse to start", missing.join(", ")),
        }
    }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let Some(path) = &config.catalog.path else {
        let catalog = ServiceCatalog::standard();
        return DoctorCheck {
            name: "service_catalog",
            status: CheckStatus::Pass,
            details: format!("built-in catalog with {} categories", catalog.categories().len()),
        };
    };

    match ServiceCatalog::load(path) {
        Ok(catalog) => DoctorCheck {
            name: "service_catalog",
            status: CheckStatus::Pass,
            details: format!(
                "loaded `{}` with {} categories",
                path.display(),
                catalog.categories().len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "service_catalog",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
