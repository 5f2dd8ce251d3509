//! Database storage types and functions

use chrono::NaiveDateTime;
use sqlx::migrate::Migrator;
use uuid::Uuid;

use crate::users::Role;
use crate::users::User;

use super::Error;

/// Migrator to run migrations on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// `SQLx` type for user role
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "user_role_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum UserRoleType {
    /// Viewer
    Viewer,

    /// Admin
    Admin,
}

impl UserRoleType {
    /// Create user role type from role
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Viewer => UserRoleType::Viewer,
            Role::Admin => UserRoleType::Admin,
        }
    }

    /// Create role from user role type
    pub fn to_role(&self) -> Role {
        match self {
            UserRoleType::Viewer => Role::Viewer,
            UserRoleType::Admin => Role::Admin,
        }
    }
}

/// `SQLx` version of user
#[derive(sqlx::FromRow)]
pub struct SqlxUser {
    /// User ID
    pub id: Uuid,

    /// Sessions ID
    pub session_id: Uuid,

    /// Username
    pub username: String,

    /// Hashed password
    pub hashed_password: String,

    /// User role
    pub role: UserRoleType,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Create user from `SQLx` version
    pub fn from_sqlx_user(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role.to_role(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }

    /// Maybe create user from `SQLx` version
    pub fn from_sqlx_user_optional(user: Option<SqlxUser>) -> Option<Self> {
        user.map(Self::from_sqlx_user)
    }

    /// Create multiple user from `SQLx` version
    pub fn from_sqlx_user_multiple(users: Vec<SqlxUser>) -> Vec<Self> {
        users.into_iter().map(Self::from_sqlx_user).collect()
    }
}

/// Convert `SQLx` to storage error
///
/// Foreign key and unique violations are constraint errors, everything else is a connection error
pub fn storage_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(database_error) = &err {
        if database_error.is_foreign_key_violation() || database_error.is_unique_violation() {
            return Error::Constraint(database_error.message().to_string());
        }
    }

    Error::Connection(err.to_string())
}
