//! Slash commands typed into the chat input
//!
//! Commands never reach the AI engine. Each one resolves to an outcome the
//! browser acts on: reload the thread, show a notice, or open a connection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::components::format_usd;
use crate::market::MarketDataSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    /// Lower-cased, without the slash
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandOutcome {
    Reload,
    Notice { message: String },
    Connect { url: String },
}

impl CommandOutcome {
    fn notice(message: impl Into<String>) -> Self {
        CommandOutcome::Notice {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not a slash command")]
    NotACommand,
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// `"/Price btc"` → `price` with `["btc"]`; `None` unless the input starts
/// with a slash followed by a name
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let rest = input.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();

    Some(SlashCommand {
        name,
        args: parts.map(str::to_string).collect(),
    })
}

pub async fn run_command(
    input: &str,
    market: &dyn MarketDataSource,
) -> Result<CommandOutcome, CommandError> {
    let command = parse_slash_command(input).ok_or(CommandError::NotACommand)?;
    tracing::debug!("slash command /{} {:?}", command.name, command.args);

    Ok(match command.name.as_str() {
        "clear" => CommandOutcome::Reload,
        "price" => match command.args.first() {
            Some(symbol) => price(symbol, market).await,
            None => CommandOutcome::notice("Please provide a symbol. Usage: /price <symbol>"),
        },
        "connect" => match command.args.first() {
            Some(url) => CommandOutcome::Connect { url: url.clone() },
            None => CommandOutcome::notice("Please provide a URL. Usage: /connect <url>"),
        },
        other => CommandOutcome::notice(format!("Unknown command: /{}", other)),
    })
}

async fn price(symbol: &str, market: &dyn MarketDataSource) -> CommandOutcome {
    let display = symbol.to_uppercase();
    let not_found = || CommandOutcome::notice(format!("Could not find price for {}", display));

    let Some(hit) = market.search(symbol).await.into_iter().next() else {
        return not_found();
    };

    match market.quotes(&[hit.id]).await.into_iter().next() {
        Some(quote) if quote.current_price > 0.0 => CommandOutcome::notice(format!(
            "Price of {}: {}",
            display,
            format_usd(quote.current_price, 8)
        )),
        _ => not_found(),
    }
}
