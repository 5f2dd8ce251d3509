//! Notes
//!
//! A note is either a casual (leaf) note or a structured note that acts as a folder

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Title used when a note is saved without one
pub const DEFAULT_TITLE: &str = "Untitled";

/// Kind of note
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "note_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum NoteType {
    /// Leaf note, never has children
    #[default]
    Casual,

    /// Folder-like note, may have children
    Structured,
}

/// A single note
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Note {
    /// Note ID
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Free text content
    pub content: String,

    /// Kind of note, fixed at creation
    #[sqlx(rename = "type")]
    pub note_type: NoteType,

    /// The structured note this note lives in
    pub parent_id: Option<Uuid>,

    /// Presentation tag, not validated
    pub color: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Moved to the trash at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Note {
    /// Is the note in the trash?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Title to store for the given input
///
/// Blank titles become [`DEFAULT_TITLE`]
pub fn title_or_default(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.trim().is_empty() => title.to_string(),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// Content to store for the given input
pub fn content_or_default(content: Option<&str>) -> String {
    match content {
        Some(content) if !content.trim().is_empty() => content.to_string(),
        _ => String::new(),
    }
}

/// Color to store for the given input, blank colors are cleared
pub fn color_or_none(color: Option<&str>) -> Option<String> {
    color
        .filter(|color| !color.trim().is_empty())
        .map(ToString::to_string)
}
