//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::notes::Note;
use crate::trash::TrashEntry;
use crate::users::User;

use super::ChangePasswordValues;
use super::CreateNoteValues;
use super::CreateUserValues;
use super::Error;
use super::NoteFilter;
use super::Result;
use super::Storage;
use super::UpdateNoteValues;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All notes in storage
    notes: Arc<Mutex<HashMap<Uuid, Note>>>,

    /// All trash entries in storage, keyed by note ID
    ///
    /// Always lock `notes` first when both are needed
    trash: Arc<Mutex<HashMap<Uuid, TrashEntry>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for Memory {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| !user.is_deleted())
            .cloned())
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        let mut users = self
            .users
            .lock()
            .await
            .values()
            .filter(|user| !user.is_deleted())
            .cloned()
            .collect::<Vec<User>>();

        users.sort_by_key(|user| user.created_at);

        Ok(users)
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .get(id)
            .filter(|user| !user.is_deleted())
            .cloned())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let mut users = self.users.lock().await;

        if users.values().any(|user| user.username == values.username) {
            return Err(Error::Constraint(format!(
                "username {} already exists",
                values.username
            )));
        }

        let now = Utc::now().naive_utc();
        let user = User {
            id: Uuid::new_v4(),
            session_id: *values.session_id,
            username: values.username.to_string(),
            hashed_password: values.hashed_password.to_string(),
            role: values.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn change_password(&self, user: &User, values: &ChangePasswordValues<'_>) -> Result<User> {
        self.users
            .lock()
            .await
            .get_mut(&user.id)
            .map(|user| {
                user.session_id = *values.session_id;
                user.hashed_password = values.hashed_password.to_string();
                user.updated_at = Utc::now().naive_utc();

                user.clone()
            })
            .ok_or_else(|| missing_user(user))
    }

    async fn rotate_session(&self, user: &User, session_id: &Uuid) -> Result<User> {
        self.users
            .lock()
            .await
            .get_mut(&user.id)
            .map(|user| {
                user.session_id = *session_id;
                user.updated_at = Utc::now().naive_utc();

                user.clone()
            })
            .ok_or_else(|| missing_user(user))
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user.id) {
            user.deleted_at = Some(Utc::now().naive_utc());
        }

        Ok(())
    }

    async fn find_single_note_by_id(&self, id: &Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get(id).cloned())
    }

    async fn find_all_notes(&self, filter: NoteFilter) -> Result<Vec<Note>> {
        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| match filter {
                NoteFilter::Active => !note.is_deleted(),
                NoteFilter::Trashed => note.is_deleted(),
                NoteFilter::ChildrenOf(parent_id) => {
                    !note.is_deleted() && note.parent_id == Some(parent_id)
                }
            })
            .cloned()
            .collect::<Vec<Note>>();

        match filter {
            NoteFilter::Active | NoteFilter::ChildrenOf(_) => {
                notes.sort_by_key(|note| Reverse(note.updated_at));
            }
            NoteFilter::Trashed => notes.sort_by_key(|note| Reverse(note.deleted_at)),
        }

        Ok(notes)
    }

    async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        let mut notes = self.notes.lock().await;

        if let Some(parent_id) = values.parent_id {
            if !notes.contains_key(parent_id) {
                return Err(missing_parent(parent_id));
            }
        }

        let note = Note {
            id: Uuid::new_v4(),
            title: values.title.to_string(),
            content: values.content.to_string(),
            note_type: values.note_type,
            parent_id: values.parent_id.copied(),
            color: values.color.map(ToString::to_string),
            created_at: *values.now,
            updated_at: *values.now,
            deleted_at: None,
        };

        notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn update_note(&self, id: &Uuid, values: &UpdateNoteValues<'_>) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get_mut(id).map(|note| {
            note.title = values.title.to_string();
            note.content = values.content.to_string();
            note.color = values.color.map(ToString::to_string);
            note.updated_at = *values.now;

            note.clone()
        }))
    }

    async fn mark_note_trashed(&self, id: &Uuid, deleted_at: &NaiveDateTime) -> Result<bool> {
        Ok(self
            .notes
            .lock()
            .await
            .get_mut(id)
            .map(|note| note.deleted_at = Some(*deleted_at))
            .is_some())
    }

    async fn mark_note_restored(&self, id: &Uuid, parent_id: Option<&Uuid>) -> Result<bool> {
        let mut notes = self.notes.lock().await;

        if let Some(parent_id) = parent_id {
            if notes.contains_key(id) && !notes.contains_key(parent_id) {
                return Err(missing_parent(parent_id));
            }
        }

        Ok(notes
            .get_mut(id)
            .map(|note| {
                note.deleted_at = None;
                note.parent_id = parent_id.copied();
            })
            .is_some())
    }

    async fn delete_note(&self, id: &Uuid) -> Result<bool> {
        let mut notes = self.notes.lock().await;
        let mut trash = self.trash.lock().await;

        if trash.contains_key(id) {
            return Err(Error::Constraint(format!("note {id} still has a trash entry")));
        }

        if notes.remove(id).is_none() {
            return Ok(false);
        }

        for note in notes.values_mut() {
            if note.parent_id.as_ref() == Some(id) {
                note.parent_id = None;
            }
        }

        for entry in trash.values_mut() {
            if entry.original_parent_id.as_ref() == Some(id) {
                entry.original_parent_id = None;
            }
        }

        Ok(true)
    }

    async fn find_trash_entry(&self, note_id: &Uuid) -> Result<Option<TrashEntry>> {
        Ok(self.trash.lock().await.get(note_id).cloned())
    }

    async fn find_all_trash_entries(&self) -> Result<Vec<TrashEntry>> {
        let mut entries = self
            .trash
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<TrashEntry>>();

        entries.sort_by_key(|entry| Reverse(entry.deleted_at));

        Ok(entries)
    }

    async fn count_trash_entries(&self) -> Result<u64> {
        Ok(self.trash.lock().await.len() as u64)
    }

    async fn create_trash_entry(&self, entry: &TrashEntry) -> Result<()> {
        let notes = self.notes.lock().await;
        let mut trash = self.trash.lock().await;

        if !notes.contains_key(&entry.note_id) {
            return Err(Error::Constraint(format!(
                "note {} does not exist",
                entry.note_id
            )));
        }

        if trash.contains_key(&entry.note_id) {
            return Err(Error::Constraint(format!(
                "note {} already has a trash entry",
                entry.note_id
            )));
        }

        if let Some(parent_id) = &entry.original_parent_id {
            if !notes.contains_key(parent_id) {
                return Err(missing_parent(parent_id));
            }
        }

        trash.insert(entry.note_id, entry.clone());

        Ok(())
    }

    async fn delete_trash_entry(&self, note_id: &Uuid) -> Result<bool> {
        Ok(self.trash.lock().await.remove(note_id).is_some())
    }
}

/// Error for a parent note that does not exist
fn missing_parent(parent_id: &Uuid) -> Error {
    Error::Constraint(format!("parent note {parent_id} does not exist"))
}

/// Error for a user that disappeared between fetching and updating
fn missing_user(user: &User) -> Error {
    Error::Connection(format!("user {} is no longer in storage", user.id))
}
