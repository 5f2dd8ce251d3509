//! All things related to the storage of notes, the trash and users

use std::future::Future;

use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::NoteType;
use crate::trash::TrashEntry;
use crate::users::Role;
use crate::users::User;

pub use memory::Memory;
pub use postgres::Postgres;

mod memory;
mod postgres;
mod types;

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// The storage refused the write because of a referential or uniqueness rule
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Which notes to list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteFilter {
    /// Notes not in the trash, most recently updated first
    Active,

    /// Notes in the trash, most recently deleted first
    Trashed,

    /// Active direct children of a note, most recently updated first
    ChildrenOf(Uuid),
}

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The role of the user
    pub role: Role,

    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to change a password of a user
pub struct ChangePasswordValues<'a> {
    /// New session ID to invalidate current tokens
    pub session_id: &'a Uuid,

    /// The new hashed password
    pub hashed_password: &'a str,
}

/// Values to create a Note
///
/// Defaults are applied by the note store, these values are stored as-is
pub struct CreateNoteValues<'a> {
    /// Title of the note
    pub title: &'a str,

    /// Content of the note
    pub content: &'a str,

    /// Kind of note
    pub note_type: NoteType,

    /// Parent of the note, has to exist
    pub parent_id: Option<&'a Uuid>,

    /// Presentation color
    pub color: Option<&'a str>,

    /// Used for both `created_at` and `updated_at`
    pub now: &'a NaiveDateTime,
}

/// Values to update a Note
///
/// The type and parent of a note can not be changed
pub struct UpdateNoteValues<'a> {
    /// New title
    pub title: &'a str,

    /// New content
    pub content: &'a str,

    /// New color, `None` clears it
    pub color: Option<&'a str>,

    /// New `updated_at`
    pub now: &'a NaiveDateTime,
}

/// Storage with all supported operations
///
/// Every operation is a single step, combining them is up to the callers
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find any single user
    ///
    /// Respects the soft-delete
    fn find_any_single_user(&self) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds all users
    ///
    /// Respects the soft-delete
    fn find_all_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Finds a single user by its username
    ///
    /// DOES NOT respect the soft-delete, usernames stay taken
    fn find_single_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds a single user by its ID
    ///
    /// Respects the soft-delete
    fn find_single_user_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Create a single user
    fn create_user(&self, values: &CreateUserValues<'_>)
    -> impl Future<Output = Result<User>> + Send;

    /// Change the password of a user
    fn change_password(
        &self,
        user: &User,
        values: &ChangePasswordValues<'_>,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Replace the session ID of a user, invalidating all its tokens
    fn rotate_session(
        &self,
        user: &User,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Soft-delete a user
    fn delete_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;

    /// Find a single note by ID
    ///
    /// DOES NOT respect the trash, check [`Note::is_deleted`]
    fn find_single_note_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Note>>> + Send;

    /// Find all notes matching the filter
    fn find_all_notes(&self, filter: NoteFilter) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Create a note
    ///
    /// Fails with [`Error::Constraint`] when the parent does not exist
    fn create_note(&self, values: &CreateNoteValues<'_>)
    -> impl Future<Output = Result<Note>> + Send;

    /// Update the title, content and color of a note
    ///
    /// `None` when the note does not exist
    fn update_note(
        &self,
        id: &Uuid,
        values: &UpdateNoteValues<'_>,
    ) -> impl Future<Output = Result<Option<Note>>> + Send;

    /// Set `deleted_at` of a note
    ///
    /// `false` when the note does not exist
    fn mark_note_trashed(
        &self,
        id: &Uuid,
        deleted_at: &NaiveDateTime,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Clear `deleted_at` of a note and put it back under the given parent
    ///
    /// `false` when the note does not exist, fails with [`Error::Constraint`] when the parent
    /// no longer exists
    fn mark_note_restored(
        &self,
        id: &Uuid,
        parent_id: Option<&Uuid>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Remove a note for good, its children move to the root
    ///
    /// `false` when the note does not exist, fails with [`Error::Constraint`] when the note still
    /// has a trash entry
    fn delete_note(&self, id: &Uuid) -> impl Future<Output = Result<bool>> + Send;

    /// Find the trash entry of a note
    fn find_trash_entry(
        &self,
        note_id: &Uuid,
    ) -> impl Future<Output = Result<Option<TrashEntry>>> + Send;

    /// Find all trash entries, most recently deleted first
    fn find_all_trash_entries(&self) -> impl Future<Output = Result<Vec<TrashEntry>>> + Send;

    /// Number of trash entries
    fn count_trash_entries(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Create a trash entry
    ///
    /// Fails with [`Error::Constraint`] when the note already has one or does not exist
    fn create_trash_entry(&self, entry: &TrashEntry) -> impl Future<Output = Result<()>> + Send;

    /// Remove the trash entry of a note
    ///
    /// `false` when there was no entry
    fn delete_trash_entry(&self, note_id: &Uuid) -> impl Future<Output = Result<bool>> + Send;
}

/// Setup the storage based on the configuration
pub enum Config {
    /// Keep everything in memory
    Memory,

    /// Connect to Postgres with a connection string
    Postgres(String),

    /// Use an existing Postgres pool
    ExistingConnection(sqlx::PgPool),
}

impl Config {
    /// Detect configuration from the environment
    ///
    /// `DATABASE_URL` selects Postgres, memory otherwise
    pub fn from_env() -> Self {
        match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Self::Postgres(url),
            _ => Self::Memory,
        }
    }
}
