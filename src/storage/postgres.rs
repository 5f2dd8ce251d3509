//! Postgres storage

use std::time::Duration;

use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::notes::Note;
use crate::trash::TrashEntry;
use crate::users::User;

use super::ChangePasswordValues;
use super::CreateNoteValues;
use super::CreateUserValues;
use super::NoteFilter;
use super::Result;
use super::Storage;
use super::UpdateNoteValues;
use super::types::MIGRATOR;
use super::types::SqlxUser;
use super::types::UserRoleType;
use super::types::storage_error;

/// Columns of a user, in the shape of [`SqlxUser`]
const USER_COLUMNS: &str = r"
    id,
    session_id,
    username,
    hashed_password,
    role,
    created_at,
    updated_at,
    deleted_at
";

/// Columns of a note, in the shape of [`Note`]
const NOTE_COLUMNS: &str = r"
    id,
    title,
    content,
    type,
    parent_id,
    color,
    created_at,
    updated_at,
    deleted_at
";

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Connect to Postgres with a connection string
    ///
    /// Migrations will be run
    pub async fn connect(database_connection_string: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_connection_string)
            .await
            .map_err(storage_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| super::Error::Connection(format!("Migrations could not run: {err}")))?;

        Ok(Self { connection_pool })
    }
}

impl Storage for Postgres {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
            LIMIT 1
            "
        ))
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at
            "
        ))
        .fetch_all(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_multiple)
        .map_err(storage_error)?;

        Ok(users)
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1
            LIMIT 1
            "
        ))
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            "
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            INSERT INTO users (id, session_id, username, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.hashed_password)
        .bind(UserRoleType::from_role(values.role))
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn change_password(&self, user: &User, values: &ChangePasswordValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            UPDATE users
            SET session_id = $1, hashed_password = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(values.session_id)
        .bind(values.hashed_password)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn rotate_session(&self, user: &User, session_id: &Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            UPDATE users
            SET session_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(session_id)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(storage_error)?;

        Ok(user)
    }

    async fn delete_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = $1
            ",
        )
        .bind(user.id)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn find_single_note_by_id(&self, id: &Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE id = $1
            LIMIT 1
            "
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(note)
    }

    async fn find_all_notes(&self, filter: NoteFilter) -> Result<Vec<Note>> {
        let (condition, order) = match filter {
            NoteFilter::Active => ("deleted_at IS NULL", "updated_at DESC"),
            NoteFilter::Trashed => ("deleted_at IS NOT NULL", "deleted_at DESC"),
            NoteFilter::ChildrenOf(_) => ("deleted_at IS NULL AND parent_id = $1", "updated_at DESC"),
        };

        let sql = format!(
            r"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE {condition}
            ORDER BY {order}
            "
        );

        let mut query = sqlx::query_as::<_, Note>(&sql);

        if let NoteFilter::ChildrenOf(parent_id) = filter {
            query = query.bind(parent_id);
        }

        let notes = query
            .fetch_all(&self.connection_pool)
            .await
            .map_err(storage_error)?;

        Ok(notes)
    }

    async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r"
            INSERT INTO notes (id, title, content, type, parent_id, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {NOTE_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.title)
        .bind(values.content)
        .bind(values.note_type)
        .bind(values.parent_id)
        .bind(values.color)
        .bind(values.now)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(note)
    }

    async fn update_note(&self, id: &Uuid, values: &UpdateNoteValues<'_>) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r"
            UPDATE notes
            SET title = $1, content = $2, color = $3, updated_at = $4
            WHERE id = $5
            RETURNING {NOTE_COLUMNS}
            "
        ))
        .bind(values.title)
        .bind(values.content)
        .bind(values.color)
        .bind(values.now)
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(note)
    }

    async fn mark_note_trashed(&self, id: &Uuid, deleted_at: &NaiveDateTime) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE notes
            SET deleted_at = $1
            WHERE id = $2
            ",
        )
        .bind(deleted_at)
        .bind(id)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_note_restored(&self, id: &Uuid, parent_id: Option<&Uuid>) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE notes
            SET deleted_at = NULL, parent_id = $1
            WHERE id = $2
            ",
        )
        .bind(parent_id)
        .bind(id)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_note(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM notes
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_trash_entry(&self, note_id: &Uuid) -> Result<Option<TrashEntry>> {
        let entry = sqlx::query_as::<_, TrashEntry>(
            r"
            SELECT note_id, original_parent_id, deleted_at
            FROM trash
            WHERE note_id = $1
            LIMIT 1
            ",
        )
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(entry)
    }

    async fn find_all_trash_entries(&self) -> Result<Vec<TrashEntry>> {
        let entries = sqlx::query_as::<_, TrashEntry>(
            r"
            SELECT note_id, original_parent_id, deleted_at
            FROM trash
            ORDER BY deleted_at DESC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(entries)
    }

    async fn count_trash_entries(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM trash
            ",
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn create_trash_entry(&self, entry: &TrashEntry) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO trash (note_id, original_parent_id, deleted_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(entry.note_id)
        .bind(entry.original_parent_id)
        .bind(entry.deleted_at)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn delete_trash_entry(&self, note_id: &Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM trash
            WHERE note_id = $1
            ",
        )
        .bind(note_id)
        .execute(&self.connection_pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }
}
