//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;

use crate::storage::Storage;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

mod current_user;
mod notes;
mod request;
mod response;
mod trash;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let users = Router::new()
        .route("/token", post(users::token::<S>))
        .route("/", get(users::list::<S>).post(users::create::<S>))
        .route("/me", get(users::single_me::<S>))
        .route("/me/permissions", get(users::permissions::<S>))
        .route("/me/logout", post(users::logout::<S>))
        .route("/me/password", put(users::change_password::<S>))
        .route(
            "/{user}",
            get(users::single::<S>).delete(users::delete::<S>),
        );

    let notes = Router::new()
        .route("/", get(notes::list::<S>).post(notes::create::<S>))
        .route("/tree", get(notes::tree::<S>))
        .route(
            "/{note}",
            get(notes::single::<S>)
                .patch(notes::update::<S>)
                .delete(notes::delete::<S>),
        )
        .route("/{note}/children", get(notes::children::<S>))
        .route("/{note}/tree", get(notes::subtree::<S>));

    let trash = Router::new()
        .route("/", get(trash::list::<S>))
        .route("/count", get(trash::count::<S>))
        .route("/{note}", delete(trash::delete::<S>))
        .route("/{note}/restore", post(trash::restore::<S>));

    Router::new()
        .nest("/users", users)
        .nest("/notes", notes)
        .nest("/trash", trash)
}
