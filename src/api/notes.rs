//! Note API management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::note_store::NewNote;
use crate::note_store::NoteChanges;
use crate::note_store::NoteStore;
use crate::notes::Note;
use crate::notes::NoteType;
use crate::storage::Storage;
use crate::tree::NoteNode;
use crate::tree::NoteTree;
use crate::users::Action;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// The note response information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub parent_id: Option<Uuid>,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl NoteResponse {
    pub fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            note_type: note.note_type,
            parent_id: note.parent_id,
            color: note.color,
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
        }
    }

    fn from_note_multiple(notes: Vec<Note>) -> Vec<Self> {
        notes.into_iter().map(Self::from_note).collect()
    }
}

/// A note in the tree, with its children
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteNodeResponse {
    #[serde(flatten)]
    pub note: NoteResponse,
    pub children: Vec<NoteNodeResponse>,
}

impl NoteNodeResponse {
    fn from_node(node: NoteNode<'_>) -> Self {
        Self {
            note: NoteResponse::from_note(node.note.clone()),
            children: node.children.into_iter().map(Self::from_node).collect(),
        }
    }
}

/// List all notes that are not in the trash
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "title": "Groceries", "type": "casual" ... } ] }
/// ```
pub async fn list<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    current_user.ensure(Action::View)?;

    let notes = notes.list_active().await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// All notes that are not in the trash, nested under their parents
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/tree
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "type": "structured", "children": [ ... ] ... } ] }
/// ```
pub async fn tree<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<NoteNodeResponse>>, Error> {
    current_user.ensure(Action::View)?;

    let notes = notes.list_active().await?;
    let tree = NoteTree::new(&notes);

    let nodes = tree
        .nested()
        .into_iter()
        .map(NoteNodeResponse::from_node)
        .collect();

    Ok(Success::ok(nodes))
}

/// A single active note with its children nested
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/<uuid>/tree
/// ```
pub async fn subtree<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteNodeResponse>, Error> {
    current_user.ensure(Action::View)?;

    let notes = notes.list_active().await?;
    let tree = NoteTree::new(&notes);

    let node = tree
        .subtree(&note_id)
        .ok_or_else(|| Error::not_found("Note not found"))?;

    Ok(Success::ok(NoteNodeResponse::from_node(node)))
}

/// Get a single note, also when it is in the trash
pub async fn single<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.ensure(Action::View)?;

    let note = notes.find(&note_id).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Direct children of a note that are not in the trash
pub async fn children<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    current_user.ensure(Action::View)?;

    let children = notes.list_children(&note_id).await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(children)))
}

/// Create note form
///
/// Everything is optional, blank values get a default
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    title: Option<String>,
    content: Option<String>,
    #[serde(rename = "type")]
    note_type: Option<NoteType>,
    parent_id: Option<Uuid>,
    color: Option<String>,
}

/// Create a note based on the [`CreateNoteForm`](CreateNoteForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Recipes", "type": "structured" }' \
///     http://localhost:6000/api/notes
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "title": "Recipes", "type": "structured" ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.ensure(Action::Create)?;

    let new_note = NewNote {
        title: form.title.as_deref(),
        content: form.content.as_deref(),
        note_type: form.note_type,
        parent_id: form.parent_id,
        color: form.color.as_deref(),
    };

    let note = notes.create(&new_note).await?;

    tracing::info!(note_id = %note.id, user = %current_user.username, "Note created");

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Update note form
///
/// The type and parent of a note are not part of it, they are ignored when sent along
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    title: Option<String>,
    content: Option<String>,
    color: Option<String>,
}

/// Overwrite the title, content and color of a note
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Recipes", "content": "", "color": "bg-green-50 dark:bg-green-900" }' \
///     http://localhost:6000/api/notes/<uuid>
/// ```
pub async fn update<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
    Form(form): Form<UpdateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.ensure(Action::Edit)?;

    let changes = NoteChanges {
        title: form.title.as_deref(),
        content: form.content.as_deref(),
        color: form.color.as_deref(),
    };

    let note = notes.update(&note_id, &changes).await?;

    tracing::info!(note_id = %note.id, user = %current_user.username, "Note updated");

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Move a note to the trash
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/notes/<uuid>
/// ```
pub async fn delete<S: Storage>(
    Extension(notes): Extension<NoteStore<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    current_user.ensure(Action::Delete)?;

    notes.move_to_trash(&note_id).await?;

    tracing::info!(%note_id, user = %current_user.username, "Note moved to the trash");

    Ok(Success::<&'static str>::no_content())
}
