use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_admin_permissions() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;

    let (status_code, permissions) = helper::permissions(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let permissions = permissions.unwrap();
    assert_eq!(Value::Bool(true), permissions["canView"]);
    assert_eq!(Value::Bool(true), permissions["canCreate"]);
    assert_eq!(Value::Bool(true), permissions["canEdit"]);
    assert_eq!(Value::Bool(true), permissions["canDelete"]);
    assert_eq!(Value::Bool(true), permissions["isAdmin"]);
    assert_eq!(Value::Bool(false), permissions["isViewer"]);
}

#[tokio::test]
async fn test_viewer_can_only_read() {
    let mut app = helper::setup_test_app().await;

    let admin_access_token = helper::login(&mut app).await;

    let note = helper::create_note(&mut app, &admin_access_token, "Recipes", "structured", None).await;
    let trashed = helper::create_note(&mut app, &admin_access_token, "Old", "casual", None).await;
    helper::maybe_trash_note(&mut app, &admin_access_token, &trashed.id).await;

    helper::maybe_create_user_with_password(
        &mut app,
        &admin_access_token,
        "someviewer",
        "viewer",
        Some("viewerpassword"),
    )
    .await;

    let access_token = helper::login_as(&mut app, "someviewer", "viewerpassword").await;

    let (status_code, permissions) = helper::permissions(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    let permissions = permissions.unwrap();
    assert_eq!(Value::Bool(true), permissions["canView"]);
    assert_eq!(Value::Bool(false), permissions["canCreate"]);
    assert_eq!(Value::Bool(false), permissions["canEdit"]);
    assert_eq!(Value::Bool(false), permissions["canDelete"]);
    assert_eq!(Value::Bool(false), permissions["isAdmin"]);
    assert_eq!(Value::Bool(true), permissions["isViewer"]);

    // reading is fine
    let (status_code, notes) = helper::list_notes(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, notes.unwrap().len());

    let (status_code, _) = helper::note_tree(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, trash) = helper::list_trash(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, trash.unwrap().len());

    // changing is not
    let (status_code, _, error) =
        helper::maybe_create_note(&mut app, &access_token, &json!({ "title": "Mine" })).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert_eq!(Some("Not allowed to access".to_string()), error);

    let (status_code, _, _) = helper::maybe_update_note(
        &mut app,
        &access_token,
        &note.id,
        &json!({ "title": "Mine" }),
    )
    .await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    let (status_code, _) = helper::maybe_trash_note(&mut app, &access_token, &note.id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    let (status_code, _) = helper::maybe_restore_note(&mut app, &access_token, &trashed.id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    let (status_code, _) =
        helper::maybe_delete_note_permanently(&mut app, &access_token, &trashed.id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    // nothing changed
    let (_, count) = helper::trash_count(&mut app, &access_token).await;
    assert_eq!(Some(1), count);
}
