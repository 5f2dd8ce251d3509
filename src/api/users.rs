//! User API management

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::password::generate;
use crate::password::hash;
use crate::password::verify;
use crate::storage::ChangePasswordValues;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::users::Action;
use crate::users::Permissions;
use crate::users::Role;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::PathParameters;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The username
    pub username: String,

    /// The role of the user
    pub role: Role,

    /// The password, if generated
    // Password should only be added when newly generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            password: None,
        }
    }

    /// Add a password to the user response
    ///
    /// This is explicit extra action to take, to make sure this is really what you want to do
    fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    /// Create a user response from multiple [`User`](User)s
    fn from_user_multiple(users: Vec<User>) -> Vec<Self> {
        users.into_iter().map(Self::from_user).collect()
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "admin", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn token<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    match user {
        Some(user) if !user.is_deleted() && verify(&user.hashed_password, &form.password) => {
            let token = generate_token(&jwt_keys, &user)?;

            tracing::info!(username = %user.username, "User logged in");

            Ok(Success::ok(token))
        }
        _ => Err(Error::bad_request("Invalid user")),
    }
}

/// List all users
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "username": "some-username", "role": "viewer" } ] }
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<Vec<UserResponse>>, Error> {
    current_user.ensure(Action::ManageUsers)?;

    let users = storage
        .find_all_users()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UserResponse::from_user_multiple(users)))
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn single_me<S: Storage>(
    current_user: CurrentUser<S>,
) -> Result<Success<UserResponse>, Error> {
    Ok(Success::ok(UserResponse::from_user(User::clone(
        &current_user,
    ))))
}

/// Get a single user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/<uuid>
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "username": "some-username", "role": "admin" } }
/// ```
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(user_id): PathParameters<Uuid>,
) -> Result<Success<UserResponse>, Error> {
    current_user.ensure(Action::ManageUsers)?;

    let user = fetch_user(&storage, &user_id).await?;

    Ok(Success::ok(UserResponse::from_user(user)))
}

/// What the current user is allowed to do with notes
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me/permissions
/// ```
///
/// Response:
/// ```json
/// { "data": { "canView": true, "canCreate": false, "canEdit": false, "canDelete": false, "isAdmin": false, "isViewer": true } }
/// ```
pub async fn permissions<S: Storage>(
    current_user: CurrentUser<S>,
) -> Result<Success<Permissions>, Error> {
    Ok(Success::ok(current_user.permissions()))
}

/// End the session of the current user
///
/// Every token of the current user stops working, also the ones handed out on other devices
///
/// Request:
/// ```sh
/// curl -v -XPOST \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me/logout
/// ```
pub async fn logout<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
) -> Result<Success<&'static str>, Error> {
    storage
        .rotate_session(&current_user, &Uuid::new_v4())
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(username = %current_user.username, "User logged out");

    Ok(Success::<&'static str>::no_content())
}

/// Create user form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    /// Role of the new user
    role: Role,
    /// Username of the new user
    username: String,
    /// Optional password of the new user
    ///
    /// When not provided a new password will be generated and returned in the response, this will
    /// be the only time the password is visible, make sure to capture it.
    password: Option<String>,
}

/// Create a user based on the [`CreateUserForm`](CreateUserForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "role": "viewer", "username": "some-other-username" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "username": "some-other-username", "role": "viewer", "password": "veryverysecret" } }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    current_user.ensure(Action::ManageUsers)?;

    if form.username.trim().is_empty() {
        return Err(Error::bad_request("Username can not be empty"));
    }

    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    if let Some(user) = user {
        return if user.is_deleted() {
            Err(Error::bad_request("User already exists and is deleted"))
        } else {
            Err(Error::bad_request("User already exists"))
        };
    }

    let (is_generated, password) = match form.password {
        Some(password) => (false, password),
        None => (true, generate()),
    };

    let hashed_password = hash(&password).map_err(Error::internal_server_error)?;

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        role: form.role,
        username: &form.username,
        hashed_password: &hashed_password,
    };

    let user = storage
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(username = %user.username, by = %current_user.username, "User created");

    let mut response = UserResponse::from_user(user);

    // only add the generated password, its the only time the password is known to anybody
    if is_generated {
        response.set_password(&password);
    }

    Ok(Success::created(response))
}

/// Change password form
///
/// New password is optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    /// Current password for verification
    current_password: String,
    /// New (optional) password
    ///
    /// When not provided a new password will be generated, the only way to find out is to
    /// provide it yourself.
    password: Option<String>,
}

/// Change the password of the current user
///
/// Changing your password will invalidate your current access token, a fresh one is returned
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "currentPassword": "verysecret", "password": "veryverysecret" }' \
///     http://localhost:6000/api/users/me/password
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn change_password<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Success<Token>, Error> {
    if !verify(&current_user.hashed_password, &form.current_password) {
        return Err(Error::bad_request("Invalid password"));
    }

    let password = form.password.unwrap_or_else(generate);
    if password.trim().is_empty() {
        return Err(Error::bad_request("Password can not be empty"));
    }

    let hashed_password = hash(&password).map_err(Error::internal_server_error)?;

    let values = ChangePasswordValues {
        session_id: &Uuid::new_v4(),
        hashed_password: &hashed_password,
    };

    let updated_user = storage
        .change_password(&current_user, &values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(username = %updated_user.username, "Password changed");

    let token = generate_token(&jwt_keys, &updated_user)?;

    Ok(Success::ok(token))
}

/// Delete a user
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/<uuid>
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(user_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    current_user.ensure(Action::ManageUsers)?;

    if user_id == current_user.id {
        return Err(Error::bad_request("Can not delete yourself"));
    }

    let user = fetch_user(&storage, &user_id).await?;

    storage
        .delete_user(&user)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::info!(username = %user.username, by = %current_user.username, "User deleted");

    Ok(Success::<&'static str>::no_content())
}

/// Fetch a user from storage
async fn fetch_user<S: Storage>(storage: &S, user_id: &Uuid) -> Result<User, Error> {
    storage
        .find_single_user_by_id(user_id)
        .await
        .map_err(Error::internal_server_error)?
        .ok_or_else(|| Error::not_found("User not found"))
}
