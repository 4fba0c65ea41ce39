//! The language client as a reqmark host
//!
//! LSP has no input box, so the answers to the text and URL prompts travel
//! in the `workspace/executeCommand` arguments. A missing answer submits
//! the prefilled value, as accepting an untouched input box would. Color
//! and disambiguation choices fall back to `window/showMessageRequest`.
//!
//! Decorations have no LSP counterpart either; they are pushed to the
//! client as `reqmark/*` notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqmark_core::{ActiveEditor, Annotation, Highlighter, Host, validate_url};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tower_lsp::Client;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{self as lsp, MessageActionItem, MessageType, Url};
use tracing::{debug, warn};

use crate::config::Config;

pub const ADD_COMMAND: &str = "reqmark.addAnnotation";
pub const DELETE_COMMAND: &str = "reqmark.deleteAnnotation";
pub const MODIFY_COMMAND: &str = "reqmark.modifyAnnotation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecorationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDecorationParams {
    pub handle: DecorationId,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDecorationsParams {
    pub handle: DecorationId,
    pub uri: Url,
    pub ranges: Vec<lsp::Range>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposeDecorationParams {
    pub handle: DecorationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEditorParams {
    pub uri: Url,
}

/// `reqmark/createDecoration`: a new color style is in use
pub enum CreateDecoration {}

impl Notification for CreateDecoration {
    type Params = CreateDecorationParams;
    const METHOD: &'static str = "reqmark/createDecoration";
}

/// `reqmark/setDecorations`: replace the ranges of a style in one document
pub enum SetDecorations {}

impl Notification for SetDecorations {
    type Params = SetDecorationsParams;
    const METHOD: &'static str = "reqmark/setDecorations";
}

/// `reqmark/disposeDecoration`: a color style is no longer used anywhere
pub enum DisposeDecoration {}

impl Notification for DisposeDecoration {
    type Params = DisposeDecorationParams;
    const METHOD: &'static str = "reqmark/disposeDecoration";
}

/// `reqmark/didChangeActiveEditor`, sent by the client
pub const ACTIVE_EDITOR_METHOD: &str = "reqmark/didChangeActiveEditor";

/// A decoration change waiting to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationEvent {
    Create(CreateDecorationParams),
    Set(SetDecorationsParams),
    Dispose(DisposeDecorationParams),
}

/// Highlighter that queues notifications for [`forward_decorations`].
///
/// It is only driven with the workspace locked, so the queue sees decoration
/// changes in the order the workspace made them, whichever request made them.
pub struct DecorationQueue<'a> {
    next_handle: &'a AtomicU64,
    events: &'a UnboundedSender<DecorationEvent>,
}

impl<'a> DecorationQueue<'a> {
    pub fn new(next_handle: &'a AtomicU64, events: &'a UnboundedSender<DecorationEvent>) -> Self {
        Self {
            next_handle,
            events,
        }
    }

    fn push(&self, event: DecorationEvent) {
        if self.events.send(event).is_err() {
            debug!("Decoration forwarder is gone, dropping event");
        }
    }
}

impl Highlighter for DecorationQueue<'_> {
    type Handle = DecorationId;

    fn create_handle(&mut self, color: &str) -> DecorationId {
        let handle = DecorationId(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.push(DecorationEvent::Create(CreateDecorationParams {
            handle,
            color: color.to_string(),
        }));
        handle
    }

    fn apply(&mut self, handle: &DecorationId, file_path: &str, ranges: &[reqmark_core::Range]) {
        let Ok(uri) = Url::from_file_path(file_path) else {
            warn!("Cannot decorate {}: not an absolute path", file_path);
            return;
        };
        self.push(DecorationEvent::Set(SetDecorationsParams {
            handle: *handle,
            uri,
            ranges: ranges.iter().copied().map(to_lsp_range).collect(),
        }));
    }

    fn dispose(&mut self, handle: DecorationId) {
        self.push(DecorationEvent::Dispose(DisposeDecorationParams { handle }));
    }
}

/// Send queued decoration changes to the client, one at a time, in order
pub async fn forward_decorations(client: Client, mut events: UnboundedReceiver<DecorationEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            DecorationEvent::Create(params) => {
                client.send_notification::<CreateDecoration>(params).await
            }
            DecorationEvent::Set(params) => {
                client.send_notification::<SetDecorations>(params).await
            }
            DecorationEvent::Dispose(params) => {
                client.send_notification::<DisposeDecoration>(params).await
            }
        }
    }
}

/// The single argument object of every reqmark command
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandArguments {
    pub uri: Option<Url>,
    pub selection: Option<lsp::Range>,
    pub position: Option<lsp::Position>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
}

impl CommandArguments {
    /// Parse the first command argument. Anything unreadable yields empty
    /// arguments, which the flows report as "no active editor".
    pub fn from_arguments(arguments: Vec<serde_json::Value>) -> Self {
        let Some(first) = arguments.into_iter().next() else {
            return Self::default();
        };
        match serde_json::from_value(first) {
            Ok(args) => args,
            Err(e) => {
                warn!("Ignoring malformed command arguments: {}", e);
                Self::default()
            }
        }
    }

    /// The editor the command was run from.
    ///
    /// With no explicit `position`, the cursor sits at the selection end.
    pub fn editor(&self) -> Option<ActiveEditor> {
        let uri = self.uri.as_ref()?;
        let file_path = file_path_of(uri)?;
        let cursor = self.position.map(from_lsp_position);
        let selection = match (self.selection, cursor) {
            (Some(selection), _) => from_lsp_range(selection),
            (None, Some(cursor)) => reqmark_core::Range::new(cursor, cursor),
            (None, None) => reqmark_core::Range::default(),
        };
        Some(ActiveEditor {
            file_path,
            selection,
            cursor: cursor.unwrap_or(selection.end),
        })
    }

    pub fn text_answer(&self, default: Option<&str>) -> String {
        self.text
            .clone()
            .unwrap_or_else(|| default.unwrap_or_default().to_string())
    }

    /// The URL answer, checked the way the URL input box validates it
    pub fn url_answer(&self, default: Option<&str>) -> Result<String, url::ParseError> {
        let answer = self
            .url
            .clone()
            .unwrap_or_else(|| default.unwrap_or_default().to_string());
        validate_url(&answer)?;
        Ok(answer.trim().to_string())
    }
}

/// Colors offered by the picker: the default first, then the palette
pub fn color_choices(palette: &[String], default: &str) -> Vec<String> {
    let mut choices = vec![default.to_string()];
    choices.extend(palette.iter().filter(|c| c.as_str() != default).cloned());
    choices
}

/// Title of the disambiguation entry for the `index`-th candidate
pub fn candidate_title(index: usize, annotation: &Annotation) -> String {
    format!("{}. {} ({})", index + 1, annotation.text, annotation.color)
}

/// Prompts answered by the command arguments and the client UI
pub struct LspHost {
    client: Client,
    args: CommandArguments,
    palette: Vec<String>,
    default_color: String,
}

impl LspHost {
    pub fn new(client: Client, args: CommandArguments, config: &Config) -> Self {
        Self {
            client,
            args,
            palette: config.palette.clone(),
            default_color: config.default_color.clone(),
        }
    }

    async fn pick(&self, message: &str, titles: Vec<String>) -> Option<String> {
        let actions = titles
            .into_iter()
            .map(|title| MessageActionItem {
                title,
                properties: Default::default(),
            })
            .collect();
        match self
            .client
            .show_message_request(MessageType::INFO, message, Some(actions))
            .await
        {
            Ok(choice) => choice.map(|item| item.title),
            Err(e) => {
                warn!("Choice request failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Host for LspHost {
    fn active_editor(&self) -> Option<ActiveEditor> {
        self.args.editor()
    }

    async fn prompt_text(&self, default: Option<&str>) -> Option<String> {
        Some(self.args.text_answer(default))
    }

    async fn prompt_url(&self, default: Option<&str>) -> Option<String> {
        match self.args.url_answer(default) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Rejected URL answer: {}", e);
                self.client
                    .show_message(MessageType::ERROR, "Invalid URL format.")
                    .await;
                None
            }
        }
    }

    async fn choose_color(&self, default: Option<&str>) -> Option<String> {
        if let Some(color) = &self.args.color {
            return Some(color.clone());
        }
        let default = default.unwrap_or(&self.default_color);
        self.pick(
            "Select highlight color",
            color_choices(&self.palette, default),
        )
        .await
    }

    async fn choose_one(&self, candidates: &[Annotation]) -> Option<usize> {
        let titles: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(i, a)| candidate_title(i, a))
            .collect();
        let chosen = self.pick("Select the annotation", titles.clone()).await?;
        titles.iter().position(|t| *t == chosen)
    }

    async fn notify(&self, message: &str) {
        self.client.show_message(MessageType::INFO, message).await;
    }
}

pub fn file_path_of(uri: &Url) -> Option<String> {
    uri.to_file_path()
        .ok()
        .map(|path| path.to_string_lossy().into_owned())
}

pub fn from_lsp_position(position: lsp::Position) -> reqmark_core::Position {
    reqmark_core::Position::new(position.line, position.character)
}

pub fn from_lsp_range(range: lsp::Range) -> reqmark_core::Range {
    reqmark_core::Range::new(from_lsp_position(range.start), from_lsp_position(range.end))
}

pub fn to_lsp_range(range: reqmark_core::Range) -> lsp::Range {
    lsp::Range {
        start: lsp::Position {
            line: range.start.line,
            character: range.start.character,
        },
        end: lsp::Position {
            line: range.end.line,
            character: range.end.character,
        },
    }
}
