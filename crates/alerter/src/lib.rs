use crate::error::AlerterError;
use configuration::TelegramConfig;
use core_types::{SignalRecord, SignalType};
use events::EngineEvent;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::broadcast;
pub mod error;

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending messages to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to gracefully disable alerting.
    pub fn new(config: &TelegramConfig) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

/// A long-running service that listens to the engine's broadcast channel and
/// sends a Telegram alert for every emitted signal and failed cycle.
///
/// Delivery failures are logged and dropped; they never reach the engine.
pub async fn run_alerter_service(
    alerter: TelegramAlerter,
    mut event_rx: broadcast::Receiver<EngineEvent>,
) {
    tracing::info!("Alerter service started. Listening for signals.");

    loop {
        match event_rx.recv().await {
            Ok(event) => {
                if let Some(msg) = format_event(&event) {
                    if let Err(e) = alerter.send_message(&msg).await {
                        tracing::error!(error = ?e, "Failed to send Telegram alert.");
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Alerter service lagged, skipped {} messages.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Broadcast channel closed. Alerter service shutting down.");
                break;
            }
        }
    }
}

/// The MarkdownV2 text for an event, or `None` if it is not worth an alert.
pub fn format_event(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::SignalEmitted(record) => format_signal(record),
        EngineEvent::CycleFailed(failure) => Some(format!(
            "🚨 *Cycle failed*\n{}",
            escape_markdown(&failure.message)
        )),
        EngineEvent::Started { .. } => None,
    }
}

fn format_signal(record: &SignalRecord) -> Option<String> {
    let (icon, title, instrument) = match record.signal_type {
        SignalType::Entry => ("📈", "BUY", record.to),
        SignalType::Exit => ("📉", "SELL", record.from),
        SignalType::None => return None,
    };
    Some(format!(
        "{} *{} {}*\n{}\n`N = {:.4}`  `V = {:.4}`\n_{}_",
        icon,
        title,
        instrument,
        escape_markdown(&record.reason),
        record.ratio,
        record.threshold,
        escape_markdown(&record.timestamp.format("%Y-%m-%d %H:%M UTC").to_string()),
    ))
}

/// A helper function to escape characters that have special meaning in Telegram's MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = r"\_*[]()~`>#+-=|{}.!";
    special_chars
        .chars()
        .fold(text.to_string(), |s, c| s.replace(c, &format!("\\{}", c)))
}
