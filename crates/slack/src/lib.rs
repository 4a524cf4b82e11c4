//! Slack integration - Events API webhook side
//!
//! This crate provides the Slack interface for tunelink:
//! - **Events** (`events`) - envelope parsing and the event dispatch table
//! - **Commands** (`commands`) - the `yo!` menu trigger and its reply text
//! - **Signature** (`signature`) - `X-Slack-Signature` request verification
//! - **Client** (`client`) - Web API calls (`chat.postMessage`, `conversations.list`)
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Event Subscriptions pointing at `https://<host>/slack/events`
//! 3. Subscribe the bot to `message.channels`
//! 4. Set env vars: `TUNELINK_SLACK_SIGNING_SECRET`, `TUNELINK_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! HTTP POST → RequestVerifier → parse_payload → EventDispatcher → MessageHandler
//!                                                                      ↓
//!                                                  ChatApi::send_message (reply)
//! ```

pub mod client;
pub mod commands;
pub mod events;
pub mod signature;
