//! In-memory annotation store

use crate::annotation::{Annotation, AnnotationId};

/// The authoritative collection of annotations for a session.
///
/// Holds annotations for any number of files; the file path is the only
/// partitioning. Insertion order is kept but carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    /// Generate an id for a new annotation
    pub fn generate_id() -> AnnotationId {
        AnnotationId::generate()
    }

    /// Append an annotation. No dedup is performed.
    pub fn add(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Remove the first annotation with `id`, returning it.
    ///
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| &a.id == id)?;
        Some(self.annotations.remove(index))
    }

    /// Overwrite the mutable fields of an annotation, returning its previous
    /// value. `id`, `file_path` and `range` are left untouched.
    ///
    /// Updating an unknown id is a no-op.
    pub fn update(
        &mut self,
        id: &AnnotationId,
        text: String,
        color: String,
        url: Option<String>,
    ) -> Option<Annotation> {
        let annotation = self.annotations.iter_mut().find(|a| &a.id == id)?;
        let previous = annotation.clone();
        annotation.text = text;
        annotation.color = color;
        annotation.url = url;
        Some(previous)
    }

    /// Replace the whole content of the store
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations belonging to `file_path`, in store order
    pub fn for_file<'a, 'b>(&'a self, file_path: &'b str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.file_path == file_path)
    }

    /// Whether any annotation, in any file, still uses `color`
    pub fn color_in_use(&self, color: &str) -> bool {
        self.annotations.iter().any(|a| a.color == color)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
