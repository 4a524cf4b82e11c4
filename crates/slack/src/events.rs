use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use tunelink_core::{ApplicationError, RequestHistory};

use crate::{
    client::{ChatApi, ChatError},
    commands::Command,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub event_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    DeliveryError(DeliveryError),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(_) => SlackEventType::Message,
            Self::DeliveryError(_) => SlackEventType::DeliveryError,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    DeliveryError,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: Option<String>,
    pub text: String,
    /// Absent for ordinary user messages (edits, joins and bot posts carry one).
    pub subtype: Option<String>,
}

/// A failure reported while receiving an event, before any handler ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryError {
    pub message: String,
}

/// Body of a request to the Events API endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundPayload {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        #[serde(default)]
        event_id: Option<String>,
        event: RawEvent,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

#[derive(Debug, Error)]
#[error("event payload is not a valid Slack envelope: {0}")]
pub struct EnvelopeError(#[from] serde_json::Error);

impl From<EnvelopeError> for ApplicationError {
    fn from(value: EnvelopeError) -> Self {
        ApplicationError::MalformedInput(value.to_string())
    }
}

pub fn parse_payload(body: &[u8]) -> Result<InboundPayload, EnvelopeError> {
    Ok(serde_json::from_slice(body)?)
}

impl RawEvent {
    pub fn into_envelope(self, event_id: impl Into<String>) -> SlackEnvelope {
        let event = match self.event_type.as_str() {
            "message" => SlackEvent::Message(MessageEvent {
                channel_id: self.channel.unwrap_or_default(),
                user_id: self.user,
                text: self.text.unwrap_or_default(),
                subtype: self.subtype,
            }),
            _ => SlackEvent::Unsupported { event_type: self.event_type },
        };
        SlackEnvelope { event_id: event_id.into(), event }
    }
}

impl SlackEnvelope {
    pub fn delivery_error(event_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event: SlackEvent::DeliveryError(DeliveryError { message: message.into() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Replied { channel_id: String, text: String },
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Chat(#[from] ChatError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

impl From<DispatchError> for ApplicationError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Handler(EventHandlerError::Chat(error)) => error.into(),
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

/// Dispatch table from event kind to handler.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(chat: Arc<dyn ChatApi>, history: RequestHistory) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(chat, history));
    dispatcher.register(DeliveryErrorHandler);
    dispatcher
}

pub struct MessageHandler {
    chat: Arc<dyn ChatApi>,
    history: RequestHistory,
}

impl MessageHandler {
    pub fn new(chat: Arc<dyn ChatApi>, history: RequestHistory) -> Self {
        Self { chat, history }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if let Some(subtype) = &event.subtype {
            debug!(
                event_name = "ingress.slack.message_skipped",
                correlation_id = %ctx.correlation_id,
                subtype = %subtype,
                "ignoring message with subtype"
            );
            return Ok(HandlerResult::Ignored);
        }

        if let Some(previous) = self.history.last() {
            debug!(
                correlation_id = %ctx.correlation_id,
                previous_request = %previous,
                "previous handled request"
            );
        }

        let Some(command) = Command::parse(&event.text) else {
            return Ok(HandlerResult::Processed);
        };

        let reply = command.reply_text();
        self.chat.send_message(&reply, &event.channel_id).await?;
        self.history.append(event.text.clone());

        info!(
            event_name = "egress.slack.reply_sent",
            correlation_id = %ctx.correlation_id,
            channel = %event.channel_id,
            command = command.keyword(),
            history_len = self.history.len(),
            "replied to channel message"
        );

        Ok(HandlerResult::Replied { channel_id: event.channel_id.clone(), text: reply })
    }
}

/// Logs delivery failures. No recovery is attempted.
pub struct DeliveryErrorHandler;

#[async_trait]
impl EventHandler for DeliveryErrorHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::DeliveryError
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::DeliveryError(failure) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        error!(
            event_name = "ingress.slack.delivery_error",
            correlation_id = %ctx.correlation_id,
            error = %failure.message,
            "ERROR: {}",
            failure.message
        );
        Ok(HandlerResult::Processed)
    }
}
