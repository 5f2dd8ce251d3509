//! API response helpers
//!
//! Every response body is an envelope: `{ "data": ... }` on success and
//! `{ "error": "...", "description": "..." }` on failure

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::note_store;
use crate::storage;
use crate::users::Action;
use crate::users::Role;

/// Hold data for a successful API interaction
pub struct Success<V: Serialize> {
    status_code: StatusCode,
    data: Option<V>,
}

impl<V: Serialize> Success<V> {
    fn new(status_code: StatusCode, data: Option<V>) -> Self {
        Self { status_code, data }
    }

    pub fn ok(data: V) -> Self {
        Self::new(StatusCode::OK, Some(data))
    }

    pub fn created(data: V) -> Self {
        Self::new(StatusCode::CREATED, Some(data))
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT, None)
    }
}

#[derive(Serialize)]
struct DataBody<D: Serialize> {
    data: D,
}

impl<V: Serialize> IntoResponse for Success<V> {
    fn into_response(self) -> Response {
        match self.data {
            Some(data) => (self.status_code, Json(DataBody { data })).into_response(),
            None => self.status_code.into_response(),
        }
    }
}

/// Hold data for a failed API interaction
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: String,
    description: Option<String>,
}

impl Error {
    fn new<M: ToString>(status_code: StatusCode, message: M) -> Self {
        Self {
            status_code,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn bad_request<M: ToString>(message: M) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden<M: ToString>(message: M) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<M: ToString>(message: M) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error<M: ToString>(message: M) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Extra details next to the message
    pub fn with_description<M: ToString>(self, description: M) -> Self {
        Self {
            description: Some(description.to_string()),
            ..self
        }
    }
}

impl From<note_store::Error> for Error {
    fn from(err: note_store::Error) -> Self {
        match err {
            note_store::Error::NotFound(_) => Error::not_found("Note not found"),
            note_store::Error::Persistence(storage::Error::Constraint(message)) => {
                Error::bad_request("Invalid note").with_description(message)
            }
            note_store::Error::Persistence(err @ storage::Error::Connection(_)) => {
                tracing::warn!("Storage failure: {err}");
                Error::internal_server_error(err)
            }
            err @ note_store::Error::InconsistentState { .. } => {
                Error::internal_server_error("Note and trash are out of sync")
                    .with_description(err)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            description: self.description.as_deref(),
        };

        (self.status_code, Json(body)).into_response()
    }
}

impl Role {
    /// Fail with `403 Forbidden` when the role does not grant the action
    pub fn is_allowed(self, action: Action) -> Result<(), Error> {
        if self.permissions().allows(action) {
            Ok(())
        } else {
            Err(Error::forbidden("Not allowed to access"))
        }
    }
}
