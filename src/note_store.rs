//! Note store
//!
//! Owns the note lifecycle: create, update, move to the trash, restore and permanently delete.
//! Every operation that changes the trash state keeps the trash ledger in step with the notes.
//!
//! The storage does not offer transactions, so the two step operations run in sequence. When the
//! first step lands and the second one fails, the note and the ledger disagree and
//! [`Error::InconsistentState`] is returned instead of an ordinary failure.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::NoteType;
use crate::notes::color_or_none;
use crate::notes::content_or_default;
use crate::notes::title_or_default;
use crate::storage;
use crate::storage::CreateNoteValues;
use crate::storage::NoteFilter;
use crate::storage::Storage;
use crate::storage::UpdateNoteValues;
use crate::trash::TrashEntry;
use crate::trash::TrashLedger;

/// Note store errors
#[derive(Debug, Error)]
pub enum Error {
    /// The note or its trash entry does not exist
    #[error("Note {0} not found")]
    NotFound(Uuid),

    /// The storage failed to read or write
    #[error(transparent)]
    Persistence(#[from] storage::Error),

    /// The first step of an operation was stored, the second was not
    #[error("Note {note_id} is out of sync with the trash: {completed} succeeded, {failed} failed: {source}")]
    InconsistentState {
        /// The affected note
        note_id: Uuid,

        /// Step that was stored
        completed: &'static str,

        /// Step that failed
        failed: &'static str,

        /// Why it failed
        source: storage::Error,
    },
}

/// Result type for all note store operations
pub type Result<T> = core::result::Result<T, Error>;

/// Input to create a note
///
/// Blank fields get their defaults
#[derive(Debug, Default)]
pub struct NewNote<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub note_type: Option<NoteType>,
    pub parent_id: Option<Uuid>,
    pub color: Option<&'a str>,
}

/// Input to update a note
///
/// There is no way to pass a type or parent, those never change through an update
#[derive(Debug, Default)]
pub struct NoteChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub color: Option<&'a str>,
}

/// A trashed note together with where it came from
#[derive(Clone, Debug)]
pub struct TrashedNote {
    pub note: Note,
    pub entry: TrashEntry,
}

/// Note lifecycle operations on top of a storage
#[derive(Clone, Debug)]
pub struct NoteStore<S: Storage> {
    storage: S,
    ledger: TrashLedger<S>,
}

impl<S: Storage> NoteStore<S> {
    pub fn new(storage: S) -> Self {
        let ledger = TrashLedger::new(storage.clone());

        Self { storage, ledger }
    }

    /// The ledger that backs the trash
    pub fn ledger(&self) -> &TrashLedger<S> {
        &self.ledger
    }

    /// Find a single note, whether it is in the trash or not
    pub async fn find(&self, id: &Uuid) -> Result<Note> {
        self.storage
            .find_single_note_by_id(id)
            .await?
            .ok_or(Error::NotFound(*id))
    }

    /// All notes not in the trash, most recently updated first
    pub async fn list_active(&self) -> Result<Vec<Note>> {
        Ok(self.storage.find_all_notes(NoteFilter::Active).await?)
    }

    /// Direct children of a note that are not in the trash
    pub async fn list_children(&self, id: &Uuid) -> Result<Vec<Note>> {
        let parent = self.find(id).await?;

        Ok(self
            .storage
            .find_all_notes(NoteFilter::ChildrenOf(parent.id))
            .await?)
    }

    /// All notes in the trash with their entries, most recently deleted first
    ///
    /// Notes and entries that disagree are left out and logged
    pub async fn list_trashed(&self) -> Result<Vec<TrashedNote>> {
        let notes = self.storage.find_all_notes(NoteFilter::Trashed).await?;
        let mut entries = self
            .ledger
            .list()
            .await?
            .into_iter()
            .map(|entry| (entry.note_id, entry))
            .collect::<HashMap<Uuid, TrashEntry>>();

        let mut trashed = Vec::with_capacity(notes.len());

        for note in notes {
            if let Some(entry) = entries.remove(&note.id) {
                trashed.push(TrashedNote { note, entry });
            } else {
                tracing::error!(note_id = %note.id, "Trashed note has no trash entry");
            }
        }

        for note_id in entries.keys() {
            tracing::error!(%note_id, "Trash entry without a trashed note");
        }

        Ok(trashed)
    }

    /// Number of notes in the trash
    pub async fn trash_count(&self) -> Result<u64> {
        Ok(self.ledger.count().await?)
    }

    /// Create a note
    ///
    /// The parent is not checked to be structured, only to exist
    pub async fn create(&self, new_note: &NewNote<'_>) -> Result<Note> {
        let title = title_or_default(new_note.title);
        let content = content_or_default(new_note.content);
        let color = color_or_none(new_note.color);
        let now = now();

        let values = CreateNoteValues {
            title: &title,
            content: &content,
            note_type: new_note.note_type.unwrap_or_default(),
            parent_id: new_note.parent_id.as_ref(),
            color: color.as_deref(),
            now: &now,
        };

        let note = self.storage.create_note(&values).await?;

        tracing::debug!(note_id = %note.id, "Created note");

        Ok(note)
    }

    /// Overwrite the title, content and color of a note
    ///
    /// Last write wins, there is no check for concurrent edits
    pub async fn update(&self, id: &Uuid, changes: &NoteChanges<'_>) -> Result<Note> {
        let note = self.find(id).await?;

        let title = title_or_default(changes.title);
        let content = content_or_default(changes.content);
        let color = color_or_none(changes.color);
        let now = now();

        let values = UpdateNoteValues {
            title: &title,
            content: &content,
            color: color.as_deref(),
            now: &now,
        };

        let note = self
            .storage
            .update_note(&note.id, &values)
            .await?
            .ok_or(Error::NotFound(note.id))?;

        tracing::debug!(note_id = %note.id, "Updated note");

        Ok(note)
    }

    /// Move a note to the trash, remembering its parent
    ///
    /// A note that is marked as deleted but has no trash entry gets its missing entry, so a
    /// retry after [`Error::InconsistentState`] puts the note in the trash
    pub async fn move_to_trash(&self, id: &Uuid) -> Result<()> {
        let note = self.find(id).await?;

        if self.ledger.find(&note.id).await?.is_some() {
            return Err(Error::Persistence(storage::Error::Constraint(format!(
                "note {} is already in the trash",
                note.id
            ))));
        }

        if let Some(deleted_at) = note.deleted_at {
            self.ledger
                .record(&note.id, note.parent_id.as_ref(), &deleted_at)
                .await?;

            tracing::warn!(note_id = %note.id, "Recorded missing trash entry");

            return Ok(());
        }

        let now = now();

        if !self.storage.mark_note_trashed(&note.id, &now).await? {
            return Err(Error::NotFound(note.id));
        }

        if let Err(err) = self
            .ledger
            .record(&note.id, note.parent_id.as_ref(), &now)
            .await
        {
            return Err(inconsistent(note.id, "mark note as deleted", "record trash entry", err));
        }

        tracing::debug!(note_id = %note.id, "Moved note to the trash");

        Ok(())
    }

    /// Take a note out of the trash and put it back under its original parent
    ///
    /// The original parent is not checked, it might be in the trash itself
    pub async fn restore_from_trash(&self, id: &Uuid) -> Result<()> {
        let entry = self.ledger.find(id).await?.ok_or(Error::NotFound(*id))?;

        if !self
            .storage
            .mark_note_restored(&entry.note_id, entry.original_parent_id.as_ref())
            .await?
        {
            return Err(Error::NotFound(entry.note_id));
        }

        match self.ledger.discard(&entry.note_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(note_id = %entry.note_id, "Trash entry was already gone");
            }
            Err(err) => {
                return Err(inconsistent(
                    entry.note_id,
                    "restore note",
                    "remove trash entry",
                    err,
                ));
            }
        }

        tracing::debug!(note_id = %entry.note_id, "Restored note from the trash");

        Ok(())
    }

    /// Remove a note for good, with its trash entry if it has one
    ///
    /// The trash entry goes first, the note refers to nothing afterwards
    pub async fn permanently_delete(&self, id: &Uuid) -> Result<()> {
        let had_entry = self.ledger.discard(id).await?;

        match self.storage.delete_note(id).await {
            Ok(true) => {}
            Ok(false) => return Err(Error::NotFound(*id)),
            Err(err) if had_entry => {
                return Err(inconsistent(*id, "remove trash entry", "delete note", err));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(note_id = %id, "Permanently deleted note");

        Ok(())
    }
}

/// Current moment, shared by all writes of a single operation
fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Build and log an inconsistent state error
fn inconsistent(
    note_id: Uuid,
    completed: &'static str,
    failed: &'static str,
    source: storage::Error,
) -> Error {
    tracing::error!(
        %note_id,
        completed,
        failed,
        "Note and trash are out of sync, manual repair needed: {source}"
    );

    Error::InconsistentState {
        note_id,
        completed,
        failed,
        source,
    }
}
