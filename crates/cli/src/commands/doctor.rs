use serde::Serialize;
use tokio::runtime::Runtime;
use tunelink_core::config::{AppConfig, LoadOptions};
use tunelink_slack::client::{ChatApi, SlackWebClient};
use tunelink_spotify::SpotifyClient;

use super::{runtime, CommandResult, EXIT_CONFIG, EXIT_RUNTIME, EXIT_UPSTREAM};

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
    #[serde(skip)]
    runtime_failed: bool,
}

const REMOTE_CHECKS: [&str; 2] = ["spotify_credentials", "slack_credentials"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();

    let exit_code = match report.checks.first() {
        Some(check) if check.status == CheckStatus::Fail => EXIT_CONFIG,
        _ if report.runtime_failed => EXIT_RUNTIME,
        _ if report.overall_status == CheckStatus::Fail => EXIT_UPSTREAM,
        _ => 0,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();
    let mut runtime_failed = false;

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match runtime("doctor") {
                Ok(runtime) => {
                    checks.push(check_spotify(&runtime, &config));
                    checks.push(check_slack(&runtime, &config));
                }
                Err(_) => {
                    runtime_failed = true;
                    checks.extend(skipped("async runtime could not be initialized"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(skipped("configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks, runtime_failed }
}

fn skipped(reason: &str) -> Vec<DoctorCheck> {
    REMOTE_CHECKS
        .into_iter()
        .map(|name| DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: format!("skipped because {reason}"),
        })
        .collect()
}

fn check_spotify(runtime: &Runtime, config: &AppConfig) -> DoctorCheck {
    let client = SpotifyClient::new(&config.spotify);
    match runtime.block_on(client.genre_seeds()) {
        Ok(genres) => DoctorCheck {
            name: "spotify_credentials",
            status: CheckStatus::Pass,
            details: format!("token granted; {} genre seeds visible", genres.len()),
        },
        Err(error) => DoctorCheck {
            name: "spotify_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_slack(runtime: &Runtime, config: &AppConfig) -> DoctorCheck {
    let client = SlackWebClient::new(&config.slack);
    let (status, details) = match runtime.block_on(client.list_channels()) {
        Ok(Some(channels)) => {
            let joined = channels.iter().filter(|channel| channel.is_member).count();
            (CheckStatus::Pass, format!("bot token accepted; member of {joined} channels"))
        }
        Ok(None) => (
            CheckStatus::Fail,
            "bot token rejected by conversations.list; check token scopes".to_string(),
        ),
        Err(error) => (CheckStatus::Fail, error.to_string()),
    };

    DoctorCheck { name: "slack_credentials", status, details }
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
