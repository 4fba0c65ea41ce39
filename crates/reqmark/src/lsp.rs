//! LSP server for reqmark
//!
//! Provides the editor side of requirement annotations:
//! - Hover: show the requirements attached to the code under the cursor
//! - Commands: add, delete and modify annotations
//! - Decorations: highlight annotated ranges through `reqmark/*` notifications

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use eyre::Result;
use reqmark_core::{
    JsonFileStorage, Outcome, Workspace, add_annotation, delete_annotation, modify_annotation,
};
use serde_json::{Value, json};
use tower_lsp::jsonrpc::{Error as LspError, Result as LspResult};
use tower_lsp::lsp_types::*;
use tokio::sync::mpsc::{self, UnboundedSender};
use tower_lsp::{Client, ClientSocket, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::config::{Config, config_path, load_config};
use crate::host::{
    ACTIVE_EDITOR_METHOD, ADD_COMMAND, ActiveEditorParams, CommandArguments, DELETE_COMMAND,
    DecorationEvent, DecorationId, DecorationQueue, LspHost, MODIFY_COMMAND, file_path_of,
    forward_decorations, from_lsp_position,
};

type AnnotationWorkspace = Workspace<JsonFileStorage, DecorationId>;

/// Run the LSP server over stdio
pub async fn run(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = build_service(root, config_path);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

/// Build the service without binding it to a transport
pub fn build_service(
    root: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> (LspService<Backend>, ClientSocket) {
    LspService::build(|client| {
        let (decorations, queued) = mpsc::unbounded_channel();
        tokio::spawn(forward_decorations(client.clone(), queued));
        Backend::new(client, decorations, root, config_path)
    })
    .custom_method(ACTIVE_EDITOR_METHOD, Backend::did_change_active_editor)
    .finish()
}

pub struct Backend {
    client: Client,
    /// Project root given on the command line, wins over the client's
    root_override: Option<PathBuf>,
    config_override: Option<PathBuf>,
    config: RwLock<Config>,
    /// Detached until `initialize` knows the project root
    workspace: Mutex<AnnotationWorkspace>,
    /// Documents the client has open; only these are re-rendered on change
    open_documents: RwLock<HashSet<Url>>,
    next_handle: AtomicU64,
    /// Decoration changes, drained in order by a single forwarding task
    decorations: UnboundedSender<DecorationEvent>,
}

impl Backend {
    fn new(
        client: Client,
        decorations: UnboundedSender<DecorationEvent>,
        root_override: Option<PathBuf>,
        config_override: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            root_override,
            config_override,
            config: RwLock::new(Config::default()),
            workspace: Mutex::new(Workspace::open(JsonFileStorage::detached())),
            open_documents: RwLock::new(HashSet::new()),
            next_handle: AtomicU64::new(1),
            decorations,
        }
    }

    fn workspace(&self) -> MutexGuard<'_, AnnotationWorkspace> {
        self.workspace.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn highlighter(&self) -> DecorationQueue<'_> {
        DecorationQueue::new(&self.next_handle, &self.decorations)
    }

    fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_open(&self, uri: &Url) -> bool {
        self.open_documents
            .read()
            .map(|docs| docs.contains(uri))
            .unwrap_or(false)
    }

    /// Pick the project root: command line, then workspace folder, then root URI
    fn project_root(&self, params: &InitializeParams) -> Option<PathBuf> {
        if let Some(root) = &self.root_override {
            return Some(root.clone());
        }
        if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first())
            && let Ok(path) = folder.uri.to_file_path()
        {
            return Some(path);
        }
        #[allow(deprecated)]
        let root_uri = params.root_uri.as_ref();
        root_uri.and_then(|uri| uri.to_file_path().ok())
    }

    /// Load config and annotations for `root`
    fn open_project(&self, root: Option<PathBuf>) {
        let Some(root) = root else {
            warn!("No workspace folder found, annotations will not be saved");
            return;
        };

        let path = self
            .config_override
            .clone()
            .unwrap_or_else(|| config_path(&root));
        let config = match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default config: {:#}", e);
                Config::default()
            }
        };

        info!("Opening project {}", root.display());
        *self.workspace() = Workspace::open(config.storage(&root));
        if let Ok(mut current) = self.config.write() {
            *current = config;
        }
    }

    /// Recompute every highlight of one document
    fn render(&self, uri: &Url) {
        let Some(path) = file_path_of(uri) else {
            return;
        };
        self.workspace().render_for_editor(&mut self.highlighter(), &path);
    }

    async fn did_change_active_editor(&self, params: ActiveEditorParams) {
        debug!("Active editor changed to {}", params.uri);
        self.render(&params.uri);
    }
}

fn outcome_json(outcome: &Outcome) -> Value {
    match outcome {
        Outcome::Added(id) => json!({ "status": "added", "id": id.as_str() }),
        Outcome::Deleted(id) => json!({ "status": "deleted", "id": id.as_str() }),
        Outcome::Modified(id) => json!({ "status": "modified", "id": id.as_str() }),
        Outcome::Aborted(reason) => json!({ "status": "aborted", "reason": reason.to_string() }),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        self.open_project(self.project_root(&params));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        ADD_COMMAND.to_string(),
                        DELETE_COMMAND.to_string(),
                        MODIFY_COMMAND.to_string(),
                    ],
                    ..Default::default()
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "reqmark".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!(
            "reqmark ready with {} annotations",
            self.workspace().store().len()
        );
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Ok(mut docs) = self.open_documents.write() {
            docs.insert(uri.clone());
        }
        self.render(&uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if self.is_open(&uri) {
            self.render(&uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Ok(mut docs) = self.open_documents.write() {
            docs.remove(&params.text_document.uri);
        }
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = from_lsp_position(params.text_document_position_params.position);

        let Some(path) = file_path_of(uri) else {
            return Ok(None);
        };
        let Some(markup) = self.workspace().hover(&path, position) else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markup,
            }),
            range: None,
        }))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        let args = CommandArguments::from_arguments(params.arguments);
        let host = LspHost::new(self.client.clone(), args, &self.config());
        let mut highlighter = self.highlighter();

        let outcome = match params.command.as_str() {
            ADD_COMMAND => add_annotation(&self.workspace, &host, &mut highlighter).await,
            DELETE_COMMAND => delete_annotation(&self.workspace, &host, &mut highlighter).await,
            MODIFY_COMMAND => modify_annotation(&self.workspace, &host, &mut highlighter).await,
            other => {
                return Err(LspError::invalid_params(format!(
                    "Unknown command: {other}"
                )));
            }
        };

        debug!("{} finished: {:?}", params.command, outcome);
        Ok(Some(outcome_json(&outcome)))
    }
}
