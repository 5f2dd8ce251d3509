//! Trash API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::note_store::NoteStore;
use crate::note_store::TrashedNote;
use crate::storage::Storage;
use crate::users::Action;

use super::CurrentUser;
use super::Error;
use super::PathParameters;
use super::Success;
use super::notes::NoteResponse;

/// A note in the trash, with the place it will be restored to
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedNoteResponse {
    #[serde(flatten)]
    pub note: NoteResponse,
    pub original_parent_id: Option<Uuid>,
    pub trashed_at: NaiveDateTime,
}

impl TrashedNoteResponse {
    fn from_trashed_note(trashed: TrashedNote) -> Self {
        Self {
            note: NoteResponse::from_note(trashed.note),
            original_parent_id: trashed.entry.original_parent_id,
            trashed_at: trashed.entry.deleted_at,
        }
    }
}

/// Number of notes in the trash
#[derive(Debug, Serialize)]
pub struct TrashCountResponse {
    pub count: u64,
}

/// List all notes in the trash, most recently deleted first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/trash
/// ```
pub async fn list<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<TrashedNoteResponse>>, Error> {
    current_user.ensure(Action::View)?;

    let trashed = notes.list_trashed().await?;

    Ok(Success::ok(
        trashed
            .into_iter()
            .map(TrashedNoteResponse::from_trashed_note)
            .collect(),
    ))
}

/// Number of notes in the trash
pub async fn count<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<TrashCountResponse>, Error> {
    current_user.ensure(Action::View)?;

    let count = notes.trash_count().await?;

    Ok(Success::ok(TrashCountResponse { count }))
}

/// Restore a note from the trash to its original parent
///
/// Request:
/// ```sh
/// curl -v -XPOST \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/trash/<uuid>/restore
/// ```
pub async fn restore<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    current_user.ensure(Action::Delete)?;

    notes.restore_from_trash(&note_id).await?;

    tracing::info!(%note_id, user = %current_user.username, "Note restored from the trash");

    Ok(Success::<&'static str>::no_content())
}

/// Permanently delete a note
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/trash/<uuid>
/// ```
pub async fn delete<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    current_user.ensure(Action::Delete)?;

    notes.permanently_delete(&note_id).await?;

    tracing::info!(%note_id, user = %current_user.username, "Note permanently deleted");

    Ok(Success::<&'static str>::no_content())
}
