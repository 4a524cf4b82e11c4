use serde_json::json;
use tunelink_core::config::AppConfig;
use tunelink_slack::client::{ChatApi, SlackWebClient};

use super::{load_config, runtime, CommandResult, EXIT_UPSTREAM};

pub fn channels() -> CommandResult {
    match load_config("channels") {
        Ok(config) => channels_with_config(&config),
        Err(result) => result,
    }
}

pub fn channels_with_config(config: &AppConfig) -> CommandResult {
    let runtime = match runtime("channels") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let client = SlackWebClient::new(&config.slack);
    match runtime.block_on(client.list_channels()) {
        Ok(Some(channels)) => CommandResult::success_with_data(
            "channels",
            format!("{} channels visible to the bot", channels.len()),
            json!(channels),
        ),
        Ok(None) => CommandResult::failure(
            "channels",
            "upstream_api",
            "slack refused to list channels; check the bot token scopes",
            EXIT_UPSTREAM,
        ),
        Err(error) => {
            CommandResult::failure("channels", "upstream_api", error.to_string(), EXIT_UPSTREAM)
        }
    }
}

pub fn send(channel: &str, text: &str) -> CommandResult {
    match load_config("send") {
        Ok(config) => send_with_config(&config, channel, text),
        Err(result) => result,
    }
}

pub fn send_with_config(config: &AppConfig, channel: &str, text: &str) -> CommandResult {
    let runtime = match runtime("send") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let client = SlackWebClient::new(&config.slack);
    match runtime.block_on(client.send_message(text, channel)) {
        Ok(()) => CommandResult::success("send", format!("message posted to `{channel}`")),
        Err(error) => CommandResult::failure("send", "upstream_api", error.to_string(), EXIT_UPSTREAM),
    }
}
