//! The per-session owner of annotations, decorations and storage

use tracing::{error, info};

use crate::annotation::{Annotation, AnnotationId};
use crate::decorations::{DecorationCache, Highlighter};
use crate::persistence::Storage;
use crate::position::Position;
use crate::query::hover_markup;
use crate::store::AnnotationStore;

/// Store, decoration cache and storage for one project.
///
/// Mutations are flushed to storage right away. Storage failures are
/// logged and otherwise ignored so a broken file never takes the host down.
///
/// `H` is the highlighter's handle type.
#[derive(Debug)]
pub struct Workspace<S, H> {
    store: AnnotationStore,
    decorations: DecorationCache<H>,
    storage: S,
}

impl<S: Storage, H> Workspace<S, H> {
    /// Load the store from `storage`, starting empty if that fails
    pub fn open(storage: S) -> Self {
        let mut workspace = Self {
            store: AnnotationStore::new(),
            decorations: DecorationCache::new(),
            storage,
        };
        workspace.reload();
        workspace
    }

    /// Replace in-memory annotations with what storage holds
    pub fn reload(&mut self) {
        match self.storage.load() {
            Ok(annotations) => self.store.replace_all(annotations),
            Err(e) => {
                error!("Error loading annotations: {:#}", e);
                self.store.replace_all(Vec::new());
            }
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn decorations(&self) -> &DecorationCache<H> {
        &self.decorations
    }

    /// Owned copies of the annotations under `position`
    pub fn find_at_position(&self, file_path: &str, position: Position) -> Vec<Annotation> {
        self.store
            .find_at_position(file_path, position)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Hover text for `position`, if any annotation covers it
    pub fn hover(&self, file_path: &str, position: Position) -> Option<String> {
        hover_markup(self.store.find_at_position(file_path, position))
    }

    pub fn insert(&mut self, annotation: Annotation) {
        info!(
            "Adding annotation {} to {} at {}",
            annotation.id, annotation.file_path, annotation.range
        );
        self.store.add(annotation);
        self.persist();
    }

    pub fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let removed = self.store.remove(id)?;
        info!("Removed annotation {}", id);
        self.persist();
        Some(removed)
    }

    /// Overwrite text, color and URL; returns the previous value
    pub fn update(
        &mut self,
        id: &AnnotationId,
        text: String,
        color: String,
        url: Option<String>,
    ) -> Option<Annotation> {
        let previous = self.store.update(id, text, color, url)?;
        info!("Modified annotation {}", id);
        self.persist();
        Some(previous)
    }

    pub fn render_for_editor<R>(&mut self, highlighter: &mut R, file_path: &str)
    where
        R: Highlighter<Handle = H>,
    {
        self.decorations
            .render_for_editor(highlighter, file_path, self.store.iter());
    }

    pub fn release_if_unused<R>(&mut self, highlighter: &mut R, color: &str) -> bool
    where
        R: Highlighter<Handle = H>,
    {
        self.decorations
            .release_if_unused(highlighter, color, &self.store)
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(self.store.as_slice()) {
            error!("Error saving annotations: {:#}", e);
        }
    }
}
