//! reqmark-core - Requirement annotations bound to source ranges
//!
//! This crate holds everything that does not depend on a particular editor:
//! - The annotation model and an in-memory [`AnnotationStore`]
//! - Position queries and hover markup
//! - Decoration recomputation against an injected [`Highlighter`]
//! - JSON persistence behind the [`Storage`] trait
//! - The add/delete/modify flows, driven through the [`Host`] trait
//!
//! # Querying annotations
//!
//! ```
//! use reqmark_core::{Annotation, AnnotationStore, Position, Range};
//!
//! let mut store = AnnotationStore::new();
//! store.add(Annotation::new(
//!     "/project/src/auth.rs",
//!     Range::new(Position::new(0, 0), Position::new(0, 10)),
//!     "Implements feature X",
//!     "#FF0000",
//!     Some("https://example.com/REQ-1".to_string()),
//! ));
//!
//! let found = store.find_at_position("/project/src/auth.rs", Position::new(0, 5));
//! assert_eq!(found.len(), 1);
//!
//! let hover = reqmark_core::hover_markup(found).unwrap();
//! assert!(hover.contains("[View Requirement](https://example.com/REQ-1)"));
//! ```
//!
//! # Hosting
//!
//! A host keeps a `Mutex<Workspace<..>>` per project, implements [`Host`]
//! for its prompts and [`Highlighter`] for its rendering, and calls the
//! flows in [`commands`] when the user runs a command.

mod annotation;
pub mod commands;
mod decorations;
mod persistence;
mod position;
mod query;
mod store;
mod workspace;

pub use annotation::{Annotation, AnnotationId};
pub use commands::{
    Abort, ActiveEditor, Host, Outcome, add_annotation, delete_annotation, modify_annotation,
    validate_url,
};
pub use decorations::{DecorationCache, Highlighter};
pub use persistence::{DEFAULT_FILE_NAME, DEFAULT_SETTINGS_DIR, JsonFileStorage, Storage};
pub use position::{Position, Range};
pub use query::hover_markup;
pub use store::AnnotationStore;
pub use workspace::Workspace;
