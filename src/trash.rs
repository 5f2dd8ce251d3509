//! Trash ledger
//!
//! Remembers where a note lived before it was moved to the trash, so it can be put back

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::storage;
use crate::storage::Storage;

/// Placement of a note at the moment it was moved to the trash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    /// The trashed note, at most one entry per note
    pub note_id: Uuid,

    /// Parent of the note right before it was trashed
    pub original_parent_id: Option<Uuid>,

    /// Same moment as the `deleted_at` of the note
    pub deleted_at: NaiveDateTime,
}

/// Owner of all trash entries
///
/// Only correlated with notes by their ID
#[derive(Clone, Debug)]
pub struct TrashLedger<S: Storage> {
    storage: S,
}

impl<S: Storage> TrashLedger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Record that a note went into the trash
    pub async fn record(
        &self,
        note_id: &Uuid,
        original_parent_id: Option<&Uuid>,
        deleted_at: &NaiveDateTime,
    ) -> storage::Result<TrashEntry> {
        let entry = TrashEntry {
            note_id: *note_id,
            original_parent_id: original_parent_id.copied(),
            deleted_at: *deleted_at,
        };

        self.storage.create_trash_entry(&entry).await?;

        Ok(entry)
    }

    /// The entry of a note, if it is in the trash
    pub async fn find(&self, note_id: &Uuid) -> storage::Result<Option<TrashEntry>> {
        self.storage.find_trash_entry(note_id).await
    }

    /// All entries, most recently deleted first
    pub async fn list(&self) -> storage::Result<Vec<TrashEntry>> {
        self.storage.find_all_trash_entries().await
    }

    /// Number of notes in the trash
    pub async fn count(&self) -> storage::Result<u64> {
        self.storage.count_trash_entries().await
    }

    /// Remove the entry of a note, `false` when it had none
    pub async fn discard(&self, note_id: &Uuid) -> storage::Result<bool> {
        self.storage.delete_trash_entry(note_id).await
    }
}
