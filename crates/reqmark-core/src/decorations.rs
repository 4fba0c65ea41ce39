//! Decoration recomputation
//!
//! Highlights are re-derived from the store on every trigger: each color's
//! full range list for a file is handed to the renderer, replacing whatever
//! it showed before. Nothing is diffed incrementally, and ranges are not
//! shifted when the document is edited.

use std::collections::BTreeMap;

use tracing::debug;

use crate::annotation::Annotation;
use crate::position::Range;
use crate::store::AnnotationStore;

/// The rendering surface decorations are drawn on.
///
/// A handle stands for "highlight these ranges in this color"; applying a
/// handle again replaces its previous ranges for that file.
pub trait Highlighter {
    type Handle;

    fn create_handle(&mut self, color: &str) -> Self::Handle;

    fn apply(&mut self, handle: &Self::Handle, file_path: &str, ranges: &[Range]);

    fn dispose(&mut self, handle: Self::Handle);
}

/// Color → handle cache shared by every editor.
///
/// Handles are created on first use of a color and released once no
/// annotation in the whole store uses that color anymore.
#[derive(Debug)]
pub struct DecorationCache<H> {
    handles: BTreeMap<String, H>,
}

impl<H> Default for DecorationCache<H> {
    fn default() -> Self {
        Self {
            handles: BTreeMap::new(),
        }
    }
}

impl<H> DecorationCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle for `color`, creating it if needed
    pub fn acquire<R>(&mut self, highlighter: &mut R, color: &str) -> &H
    where
        R: Highlighter<Handle = H>,
    {
        self.handles.entry(color.to_owned()).or_insert_with(|| {
            debug!("Creating decoration handle for color {}", color);
            highlighter.create_handle(color)
        })
    }

    /// Re-render every highlight of `file_path`.
    ///
    /// Annotations of other files are ignored, so the whole store can be
    /// passed in. Cached colors with no range left in this file get an
    /// empty range list.
    pub fn render_for_editor<'a, R>(
        &mut self,
        highlighter: &mut R,
        file_path: &str,
        annotations: impl IntoIterator<Item = &'a Annotation>,
    ) where
        R: Highlighter<Handle = H>,
    {
        let mut by_color: BTreeMap<&str, Vec<Range>> = BTreeMap::new();
        for annotation in annotations {
            if annotation.file_path == file_path {
                by_color
                    .entry(annotation.color.as_str())
                    .or_default()
                    .push(annotation.range);
            }
        }

        debug!(
            "Rendering {} colors for {}",
            by_color.len(),
            file_path
        );

        for (color, ranges) in &by_color {
            let handle = self.acquire(highlighter, color);
            highlighter.apply(handle, file_path, ranges);
        }

        for (color, handle) in &self.handles {
            if !by_color.contains_key(color.as_str()) {
                highlighter.apply(handle, file_path, &[]);
            }
        }
    }

    /// Dispose the handle for `color` if nothing in `store` uses it.
    ///
    /// Returns whether a handle was released.
    pub fn release_if_unused<R>(
        &mut self,
        highlighter: &mut R,
        color: &str,
        store: &AnnotationStore,
    ) -> bool
    where
        R: Highlighter<Handle = H>,
    {
        if store.color_in_use(color) {
            return false;
        }
        match self.handles.remove(color) {
            Some(handle) => {
                debug!("Releasing decoration handle for color {}", color);
                highlighter.dispose(handle);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, color: &str) -> bool {
        self.handles.contains_key(color)
    }

    pub fn get(&self, color: &str) -> Option<&H> {
        self.handles.get(color)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
