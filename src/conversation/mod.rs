//! Conversation types and transcript export
//!
//! Threads belong to the AI engine's client library; the service only models
//! them well enough to turn one into a downloadable transcript.

pub mod commands;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: Option<String>,
}

/// Typed view of one content part, used only for Markdown
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Resource {
        #[serde(default)]
        resource: Option<ResourceRef>,
    },
    ImageUrl {
        #[serde(default)]
        image_url: Option<ImageRef>,
    },
    Component {
        name: String,
    },
    #[serde(other)]
    Unknown,
}

impl ContentPart {
    fn to_markdown(&self) -> String {
        match self {
            ContentPart::Text { text } => text.clone(),
            ContentPart::Resource { resource } => format!(
                "[Resource: {}]",
                resource
                    .as_ref()
                    .and_then(|r| r.uri.as_deref())
                    .unwrap_or("undefined")
            ),
            ContentPart::ImageUrl { image_url } => format!(
                "![Image]({})",
                image_url
                    .as_ref()
                    .and_then(|i| i.url.as_deref())
                    .unwrap_or("undefined")
            ),
            ContentPart::Component { name } => format!("[Component: {}]", name),
            ContentPart::Unknown => String::new(),
        }
    }
}

/// A thread as the client library holds it. Messages stay raw JSON so the
/// JSON transcript returns them exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Thread has no messages to export")]
    EmptyThread,

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status = match self {
            ExportError::EmptyThread => StatusCode::BAD_REQUEST,
            ExportError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// A rendered transcript ready to download
#[derive(Debug, Clone)]
pub struct Transcript {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl Thread {
    pub fn export(&self, format: ExportFormat) -> Result<Transcript, ExportError> {
        if self.messages.is_empty() {
            return Err(ExportError::EmptyThread);
        }

        let body = match format {
            ExportFormat::Markdown => self.to_markdown(),
            ExportFormat::Json => serde_json::to_string_pretty(&self.messages)?,
        };

        Ok(Transcript {
            filename: format!("chat-{}.{}", self.id, format.extension()),
            content_type: format.content_type(),
            body,
        })
    }

    /// Tool messages are dropped; everything else is labelled as either
    /// the user or the assistant
    pub fn to_markdown(&self) -> String {
        self.messages
            .iter()
            .filter_map(message_markdown)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn message_markdown(message: &Value) -> Option<String> {
    let role = match message.get("role").and_then(|r| Role::deserialize(r).ok()) {
        Some(Role::Tool) => return None,
        Some(Role::User) => "**User**",
        _ => "**Assistant**",
    };

    // Missing or null content renders as an empty entry
    let content = match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| {
                ContentPart::deserialize(part)
                    .map(|p| p.to_markdown())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };

    Some(format!("{}:\n{}\n\n---\n", role, content))
}
