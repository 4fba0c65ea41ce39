//! Add, delete and modify flows
//!
//! Each flow is a straight sequence of prompts that stops at the first
//! cancelled answer. The workspace is only touched once every answer is in,
//! so an aborted flow leaves the store and its file exactly as they were.
//! The workspace lock is never held across a prompt.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::decorations::Highlighter;
use crate::persistence::Storage;
use crate::position::{Position, Range};
use crate::workspace::Workspace;

/// The editor the user invoked a command from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEditor {
    pub file_path: String,
    pub selection: Range,
    pub cursor: Position,
}

/// Everything a flow needs from the host editor.
///
/// Prompts return `None` when the user cancelled. URL answers are expected
/// to be validated by the host already: an empty string means "no URL".
#[async_trait]
pub trait Host: Send + Sync {
    fn active_editor(&self) -> Option<ActiveEditor>;

    async fn prompt_text(&self, default: Option<&str>) -> Option<String>;

    async fn prompt_url(&self, default: Option<&str>) -> Option<String>;

    async fn choose_color(&self, default: Option<&str>) -> Option<String>;

    /// Pick one of several overlapping annotations, by index
    async fn choose_one(&self, candidates: &[Annotation]) -> Option<usize>;

    /// Show a short informational message
    async fn notify(&self, message: &str);
}

/// How a flow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(AnnotationId),
    Deleted(AnnotationId),
    Modified(AnnotationId),
    Aborted(Abort),
}

/// Why a flow stopped without touching the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    NoActiveEditor,
    EmptySelection,
    TextCancelled,
    UrlCancelled,
    /// Modify flow text prompt dismissed or answered empty
    EditTextCancelled,
    EditUrlCancelled,
    ColorCancelled,
    NothingAtCursor,
    /// The disambiguation choice was dismissed
    SelectionCancelled,
    /// The chosen annotation was removed while the prompts were open
    Vanished,
}

impl Abort {
    /// Message shown to the user, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Abort::NoActiveEditor => Some("No active editor detected."),
            Abort::EmptySelection => Some("No code selected."),
            Abort::TextCancelled => Some("Annotation cancelled or empty."),
            Abort::UrlCancelled => Some("Annotation cancelled or invalid URL."),
            Abort::EditTextCancelled => Some("Modification cancelled or invalid."),
            Abort::EditUrlCancelled => Some("Modification cancelled or invalid URL."),
            Abort::ColorCancelled => Some("No color selected."),
            Abort::NothingAtCursor => Some("No annotations found at the cursor position."),
            Abort::SelectionCancelled => None,
            Abort::Vanished => Some("The annotation no longer exists."),
        }
    }
}

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message().unwrap_or("Cancelled."))
    }
}

/// Annotate the current selection
pub async fn add_annotation<S, R, H>(
    workspace: &Mutex<Workspace<S, R::Handle>>,
    host: &H,
    highlighter: &mut R,
) -> Outcome
where
    S: Storage,
    R: Highlighter,
    H: Host + ?Sized,
{
    let Some(editor) = host.active_editor() else {
        return abort(host, Abort::NoActiveEditor).await;
    };
    if editor.selection.is_empty() {
        return abort(host, Abort::EmptySelection).await;
    }

    let text = match host.prompt_text(None).await {
        Some(text) if !text.is_empty() => text,
        _ => return abort(host, Abort::TextCancelled).await,
    };
    let Some(url) = host.prompt_url(None).await else {
        return abort(host, Abort::UrlCancelled).await;
    };
    let Some(color) = host.choose_color(None).await.filter(|c| !c.is_empty()) else {
        return abort(host, Abort::ColorCancelled).await;
    };

    let annotation = Annotation::new(
        editor.file_path.clone(),
        editor.selection,
        text,
        color,
        normalize_url(&url),
    );
    let id = annotation.id.clone();

    {
        let mut workspace = lock(workspace);
        workspace.insert(annotation);
        workspace.render_for_editor(highlighter, &editor.file_path);
    }

    Outcome::Added(id)
}

/// Delete the annotation under the cursor
pub async fn delete_annotation<S, R, H>(
    workspace: &Mutex<Workspace<S, R::Handle>>,
    host: &H,
    highlighter: &mut R,
) -> Outcome
where
    S: Storage,
    R: Highlighter,
    H: Host + ?Sized,
{
    let Some(editor) = host.active_editor() else {
        return abort(host, Abort::NoActiveEditor).await;
    };

    let matches = lock(workspace).find_at_position(&editor.file_path, editor.cursor);
    let target = match pick(host, matches).await {
        Ok(target) => target,
        Err(reason) => return abort(host, reason).await,
    };

    let removed = {
        let mut workspace = lock(workspace);
        let removed = workspace.remove(&target.id);
        if let Some(removed) = &removed {
            workspace.render_for_editor(highlighter, &editor.file_path);
            workspace.release_if_unused(highlighter, &removed.color);
        }
        removed
    };

    match removed {
        Some(removed) => {
            host.notify("Annotation deleted.").await;
            Outcome::Deleted(removed.id)
        }
        None => abort(host, Abort::Vanished).await,
    }
}

/// Edit text, URL and color of the annotation under the cursor
pub async fn modify_annotation<S, R, H>(
    workspace: &Mutex<Workspace<S, R::Handle>>,
    host: &H,
    highlighter: &mut R,
) -> Outcome
where
    S: Storage,
    R: Highlighter,
    H: Host + ?Sized,
{
    let Some(editor) = host.active_editor() else {
        return abort(host, Abort::NoActiveEditor).await;
    };

    let matches = lock(workspace).find_at_position(&editor.file_path, editor.cursor);
    let target = match pick(host, matches).await {
        Ok(target) => target,
        Err(reason) => return abort(host, reason).await,
    };

    let text = match host.prompt_text(Some(&target.text)).await {
        Some(text) if !text.is_empty() => text,
        _ => return abort(host, Abort::EditTextCancelled).await,
    };
    let Some(url) = host.prompt_url(target.url.as_deref()).await else {
        return abort(host, Abort::EditUrlCancelled).await;
    };
    let Some(color) = host
        .choose_color(Some(&target.color))
        .await
        .filter(|c| !c.is_empty())
    else {
        return abort(host, Abort::ColorCancelled).await;
    };

    let previous = {
        let mut workspace = lock(workspace);
        let previous = workspace.update(&target.id, text, color.clone(), normalize_url(&url));
        if let Some(previous) = &previous {
            workspace.render_for_editor(highlighter, &editor.file_path);
            if previous.color != color {
                workspace.release_if_unused(highlighter, &previous.color);
            }
        }
        previous
    };

    match previous {
        Some(previous) => {
            host.notify("Annotation modified.").await;
            Outcome::Modified(previous.id)
        }
        None => abort(host, Abort::Vanished).await,
    }
}

/// Resolve the matches under the cursor to a single annotation
async fn pick<H: Host + ?Sized>(
    host: &H,
    mut matches: Vec<Annotation>,
) -> Result<Annotation, Abort> {
    match matches.len() {
        0 => Err(Abort::NothingAtCursor),
        1 => Ok(matches.remove(0)),
        n => {
            debug!("{} annotations under cursor, asking which one", n);
            let index = host
                .choose_one(&matches)
                .await
                .ok_or(Abort::SelectionCancelled)?;
            if index < matches.len() {
                Ok(matches.swap_remove(index))
            } else {
                Err(Abort::SelectionCancelled)
            }
        }
    }
}

async fn abort<H: Host + ?Sized>(host: &H, reason: Abort) -> Outcome {
    debug!("Command aborted: {:?}", reason);
    if let Some(message) = reason.message() {
        host.notify(message).await;
    }
    Outcome::Aborted(reason)
}

/// Trimmed URL, or `None` for an empty answer
fn normalize_url(url: &str) -> Option<String> {
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_owned())
}

fn lock<S, H>(workspace: &Mutex<Workspace<S, H>>) -> MutexGuard<'_, Workspace<S, H>> {
    workspace.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Check a URL answer: empty is accepted as "no URL", anything else must
/// parse as an absolute URL.
pub fn validate_url(input: &str) -> Result<(), url::ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(());
    }
    url::Url::parse(input).map(|_| ())
}
