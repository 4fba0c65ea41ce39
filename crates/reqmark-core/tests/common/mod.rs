//! Common test utilities.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use reqmark_core::{
    ActiveEditor, Annotation, Highlighter, Host, Position, Range, Storage, Workspace,
};

pub const FILE: &str = "/project/src/feature.rs";

pub fn span(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
    Range::new(Position::new(sl, sc), Position::new(el, ec))
}

/// Storage that keeps every saved snapshot in memory.
#[derive(Default)]
pub struct MemoryStorage {
    initial: Vec<Annotation>,
    saves: Mutex<Vec<Vec<Annotation>>>,
}

impl MemoryStorage {
    pub fn with(initial: Vec<Annotation>) -> Self {
        Self {
            initial,
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<Vec<Annotation>> {
        self.saves.lock().unwrap().last().cloned()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> eyre::Result<Vec<Annotation>> {
        Ok(self.initial.clone())
    }

    fn save(&self, annotations: &[Annotation]) -> eyre::Result<()> {
        self.saves.lock().unwrap().push(annotations.to_vec());
        Ok(())
    }
}

pub type TestWorkspace = Mutex<Workspace<MemoryStorage, u32>>;

pub fn workspace(initial: Vec<Annotation>) -> TestWorkspace {
    Mutex::new(Workspace::open(MemoryStorage::with(initial)))
}

/// Highlighter event log; handles are sequence numbers.
#[derive(Default)]
pub struct Recorder {
    next: u32,
    pub created: Vec<(u32, String)>,
    pub applied: Vec<(u32, String, Vec<Range>)>,
    pub disposed: Vec<u32>,
}

impl Highlighter for Recorder {
    type Handle = u32;

    fn create_handle(&mut self, color: &str) -> u32 {
        self.next += 1;
        self.created.push((self.next, color.to_owned()));
        self.next
    }

    fn apply(&mut self, handle: &u32, file_path: &str, ranges: &[Range]) {
        self.applied.push((*handle, file_path.to_owned(), ranges.to_vec()));
    }

    fn dispose(&mut self, handle: u32) {
        self.disposed.push(handle);
    }
}

/// Host with canned answers. `None` answers behave as a cancelled prompt.
#[derive(Default)]
pub struct ScriptedHost {
    pub editor: Option<ActiveEditor>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub choice: Option<usize>,
    /// (prompt name, default it was opened with)
    pub prompts: Mutex<Vec<(&'static str, Option<String>)>>,
    pub candidates_shown: Mutex<Vec<Vec<String>>>,
    pub notices: Mutex<Vec<String>>,
}

impl ScriptedHost {
    /// Editor with `selection` selected and the cursor at its end
    pub fn at_selection(selection: Range) -> Self {
        Self {
            editor: Some(ActiveEditor {
                file_path: FILE.to_string(),
                selection,
                cursor: selection.end,
            }),
            ..Default::default()
        }
    }

    /// Editor with an empty selection at `cursor`
    pub fn at_cursor(cursor: Position) -> Self {
        Self::at_selection(Range::new(cursor, cursor))
    }

    pub fn answers(mut self, text: &str, url: &str, color: &str) -> Self {
        self.text = Some(text.to_string());
        self.url = Some(url.to_string());
        self.color = Some(color.to_string());
        self
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<(&'static str, Option<String>)> {
        self.prompts.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str, default: Option<&str>) {
        self.prompts
            .lock()
            .unwrap()
            .push((name, default.map(str::to_owned)));
    }
}

#[async_trait]
impl Host for ScriptedHost {
    fn active_editor(&self) -> Option<ActiveEditor> {
        self.editor.clone()
    }

    async fn prompt_text(&self, default: Option<&str>) -> Option<String> {
        self.record("text", default);
        self.text.clone()
    }

    async fn prompt_url(&self, default: Option<&str>) -> Option<String> {
        self.record("url", default);
        self.url.clone()
    }

    async fn choose_color(&self, default: Option<&str>) -> Option<String> {
        self.record("color", default);
        self.color.clone()
    }

    async fn choose_one(&self, candidates: &[Annotation]) -> Option<usize> {
        self.candidates_shown
            .lock()
            .unwrap()
            .push(candidates.iter().map(|a| a.color.clone()).collect());
        self.choice
    }

    async fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}
