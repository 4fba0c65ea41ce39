//! Position queries and hover markup

use crate::annotation::Annotation;
use crate::position::Position;
use crate::store::AnnotationStore;

impl AnnotationStore {
    /// All annotations of `file_path` whose range contains `position`.
    ///
    /// Results come back in store order. Overlapping annotations all match;
    /// callers disambiguate.
    pub fn find_at_position(&self, file_path: &str, position: Position) -> Vec<&Annotation> {
        self.for_file(file_path)
            .filter(|a| a.range.contains(position))
            .collect()
    }
}

/// Render the hover text for the annotations under the cursor.
///
/// Returns `None` when nothing matched.
pub fn hover_markup<'a>(matches: impl IntoIterator<Item = &'a Annotation>) -> Option<String> {
    let sections: Vec<String> = matches
        .into_iter()
        .map(|annotation| {
            let mut section = format!("**Requirement:** {}", annotation.text);
            if let Some(url) = &annotation.url {
                section.push_str(&format!("\n\n[View Requirement]({url})"));
            }
            section
        })
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
