use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tower::Service;
use uuid::Uuid;

use crate::setup_app;
use crate::storage::Config;

/// Test helper version of User struct
#[derive(Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub password: Option<String>,
}

/// Test helper version of Note struct
#[derive(Debug, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub note_type: String,
    pub parent_id: Option<Uuid>,
    pub color: Option<String>,
    pub is_deleted: bool,
}

/// Test helper version of a trashed note
#[derive(Debug)]
pub struct TrashedNote {
    pub note: Note,
    pub original_parent_id: Option<Uuid>,
}

/// Test helper version of a tree node
#[derive(Debug)]
pub struct TreeNode {
    pub id: Uuid,
    pub children: Vec<TreeNode>,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub description: Option<String>,
}

/// Inject some environment variables to match our tests
fn setup_test_environment() {
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var("INITIAL_USERNAME", "admin");
        std::env::set_var("INITIAL_PASSWORD", "verysecret");
        std::env::set_var("JWT_SECRET", "verysecret");
    }
}

/// Setup the Notely app with a fresh memory storage
pub async fn setup_test_app() -> Router {
    setup_test_environment();

    setup_app(Config::Memory).await.unwrap()
}

/// Setup the Notely app on top of a (test) database
pub async fn setup_test_app_with_pool(pool: sqlx::PgPool) -> Router {
    setup_test_environment();

    setup_app(Config::ExistingConnection(pool)).await.unwrap()
}

/// Send a request and collect the whole response body
async fn send(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: Option<&str>,
    payload: Option<&Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    let body = if let Some(payload) = payload {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
        Body::from(serde_json::to_vec(payload).unwrap())
    } else {
        Body::empty()
    };

    let request = builder.body(body).unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

fn error_message_for(status_code: StatusCode, body: &Bytes) -> Option<String> {
    if status_code.is_client_error() || status_code.is_server_error() {
        Some(get_error_message(body))
    } else {
        None
    }
}

pub async fn maybe_login(
    app: &mut Router,
    username: &str,
    password: &str,
) -> (StatusCode, Option<String>) {
    let payload = json!({ "username": username, "password": password });

    let (status_code, body) =
        send(app, Method::POST, "/api/users/token", None, Some(&payload)).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_access_token(&body))
        } else {
            None
        },
    )
}

pub async fn login_as(app: &mut Router, username: &str, password: &str) -> String {
    let (status_code, access_token) = maybe_login(app, username, password).await;

    assert_eq!(StatusCode::OK, status_code);

    access_token.unwrap()
}

pub async fn login_with_password(app: &mut Router, password: &str) -> String {
    login_as(app, "admin", password).await
}

pub async fn login(app: &mut Router) -> String {
    login_with_password(app, "verysecret").await
}

pub async fn logout(app: &mut Router, access_token: &str) -> StatusCode {
    let (status_code, _) = send(
        app,
        Method::POST,
        "/api/users/me/logout",
        Some(access_token),
        None,
    )
    .await;

    status_code
}

pub async fn maybe_change_password(
    app: &mut Router,
    access_token: &str,
    current_password: &str,
    password: &str,
) -> (StatusCode, Option<String>, Option<String>) {
    let payload = json!({ "currentPassword": current_password, "password": password });

    let (status_code, body) = send(
        app,
        Method::PUT,
        "/api/users/me/password",
        Some(access_token),
        Some(&payload),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_access_token(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn permissions(app: &mut Router, access_token: &str) -> (StatusCode, Option<Value>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        "/api/users/me/permissions",
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(serde_json::from_slice::<Value>(&body[..]).unwrap()["data"].clone())
        } else {
            None
        },
    )
}

pub async fn current_user(app: &mut Router, access_token: &str) -> (StatusCode, Option<User>) {
    let (status_code, body) =
        send(app, Method::GET, "/api/users/me", Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_user(&body))
        } else {
            None
        },
    )
}

pub async fn single_user(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<User>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("/api/users/{id}"),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_user(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_delete_user(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::DELETE,
        &format!("/api/users/{id}"),
        Some(access_token),
        None,
    )
    .await;

    (status_code, error_message_for(status_code, &body))
}

pub async fn list_users(app: &mut Router, access_token: &str) -> (StatusCode, Option<Vec<User>>) {
    let (status_code, body) = send(app, Method::GET, "/api/users", Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_users(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_user_with_password(
    app: &mut Router,
    access_token: &str,
    username: &str,
    role: &str,
    password: Option<&str>,
) -> (StatusCode, Option<User>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("username".to_string(), Value::String(username.to_string()));
    payload.insert("role".to_string(), Value::String(role.to_string()));

    if let Some(password) = password {
        payload.insert("password".to_string(), Value::String(password.to_string()));
    }

    let (status_code, body) = send(
        app,
        Method::POST,
        "/api/users",
        Some(access_token),
        Some(&Value::Object(payload)),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_user(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_create_user(
    app: &mut Router,
    access_token: &str,
    username: &str,
    role: &str,
) -> (StatusCode, Option<User>, Option<String>) {
    maybe_create_user_with_password(app, access_token, username, role, None).await
}

pub async fn maybe_create_note(
    app: &mut Router,
    access_token: &str,
    payload: &Value,
) -> (StatusCode, Option<Note>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        "/api/notes",
        Some(access_token),
        Some(payload),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_note(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

/// Create a note that has to succeed
pub async fn create_note(
    app: &mut Router,
    access_token: &str,
    title: &str,
    note_type: &str,
    parent_id: Option<&Uuid>,
) -> Note {
    let payload = json!({
        "title": title,
        "type": note_type,
        "parentId": parent_id,
    });

    let (status_code, note, _) = maybe_create_note(app, access_token, &payload).await;
    assert_eq!(StatusCode::CREATED, status_code);

    note.unwrap()
}

pub async fn maybe_create_note_with_raw_body(
    app: &mut Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let mut builder = Request::builder().method(Method::POST).uri("/api/notes");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder
        .header(AUTHORIZATION, access_token)
        .body(Body::from(body.as_bytes()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_note(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error(&body))
        } else {
            None
        },
    )
}

pub async fn single_note_with_str(
    app: &mut Router,
    access_token: &str,
    note_id: &str,
) -> (StatusCode, Option<Note>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("/api/notes/{note_id}"),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_note(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn single_note(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<Note>, Option<String>) {
    single_note_with_str(app, access_token, &note_id.to_string()).await
}

pub async fn list_notes(app: &mut Router, access_token: &str) -> (StatusCode, Option<Vec<Note>>) {
    let (status_code, body) = send(app, Method::GET, "/api/notes", Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_notes(&body))
        } else {
            None
        },
    )
}

pub async fn list_children(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<Vec<Note>>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("/api/notes/{note_id}/children"),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_notes(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn note_tree(app: &mut Router, access_token: &str) -> (StatusCode, Option<Vec<TreeNode>>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        "/api/notes/tree",
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_tree(&body))
        } else {
            None
        },
    )
}

pub async fn note_subtree(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<TreeNode>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("/api/notes/{note_id}/tree"),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(value_to_tree_node(
                &serde_json::from_slice::<Value>(&body[..]).unwrap()["data"],
            ))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_update_note(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
    payload: &Value,
) -> (StatusCode, Option<Note>, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::PATCH,
        &format!("/api/notes/{note_id}"),
        Some(access_token),
        Some(payload),
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_note(&body))
        } else {
            None
        },
        error_message_for(status_code, &body),
    )
}

pub async fn maybe_trash_note(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::DELETE,
        &format!("/api/notes/{note_id}"),
        Some(access_token),
        None,
    )
    .await;

    (status_code, error_message_for(status_code, &body))
}

pub async fn list_trash(
    app: &mut Router,
    access_token: &str,
) -> (StatusCode, Option<Vec<TrashedNote>>) {
    let (status_code, body) = send(app, Method::GET, "/api/trash", Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_trashed_notes(&body))
        } else {
            None
        },
    )
}

pub async fn trash_count(app: &mut Router, access_token: &str) -> (StatusCode, Option<u64>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        "/api/trash/count",
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["count"].as_u64()
        } else {
            None
        },
    )
}

pub async fn maybe_restore_note(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &format!("/api/trash/{note_id}/restore"),
        Some(access_token),
        None,
    )
    .await;

    (status_code, error_message_for(status_code, &body))
}

pub async fn maybe_delete_note_permanently(
    app: &mut Router,
    access_token: &str,
    note_id: &Uuid,
) -> (StatusCode, Option<String>) {
    let (status_code, body) = send(
        app,
        Method::DELETE,
        &format!("/api/trash/{note_id}"),
        Some(access_token),
        None,
    )
    .await;

    (status_code, error_message_for(status_code, &body))
}

fn value_to_user(user: &Map<String, Value>) -> User {
    User {
        id: user["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        username: user["username"].as_str().map(ToString::to_string).unwrap(),
        role: user["role"].as_str().map(ToString::to_string).unwrap(),
        password: user
            .get("password")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn get_user(body: &Bytes) -> User {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_user)
        .unwrap()
}

fn get_users(body: &Bytes) -> Vec<User> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_user)
        .collect()
}

fn value_to_optional_uuid(value: &Value) -> Option<Uuid> {
    value.as_str().map(|id| Uuid::parse_str(id).unwrap())
}

fn value_to_note(note: &Map<String, Value>) -> Note {
    Note {
        id: note["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        title: note["title"].as_str().map(ToString::to_string).unwrap(),
        content: note["content"].as_str().map(ToString::to_string).unwrap(),
        note_type: note["type"].as_str().map(ToString::to_string).unwrap(),
        parent_id: value_to_optional_uuid(&note["parentId"]),
        color: note["color"].as_str().map(ToString::to_string),
        is_deleted: !note["deletedAt"].is_null(),
    }
}

fn get_note(body: &Bytes) -> Note {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_note)
        .unwrap()
}

fn get_notes(body: &Bytes) -> Vec<Note> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_note)
        .collect()
}

fn get_trashed_notes(body: &Bytes) -> Vec<TrashedNote> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(|trashed| TrashedNote {
            note: value_to_note(trashed),
            original_parent_id: value_to_optional_uuid(&trashed["originalParentId"]),
        })
        .collect()
}

fn value_to_tree_node(node: &Value) -> TreeNode {
    TreeNode {
        id: node["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        children: node["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(value_to_tree_node)
            .collect(),
    }
}

fn get_tree(body: &Bytes) -> Vec<TreeNode> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(value_to_tree_node)
        .collect()
}

fn value_to_error(error: &Map<String, Value>) -> Error {
    Error {
        error: error["error"].as_str().map(ToString::to_string).unwrap(),
        description: error
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn get_error(body: &Bytes) -> Error {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_error)
        .unwrap()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}

fn get_access_token(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["access_token"]
        .as_str()
        .map(|access_token| format!("Bearer {access_token}"))
        .unwrap()
}
