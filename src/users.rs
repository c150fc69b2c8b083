//! Staff account management.
//!
//! Administrator-only; there is no self-registration. Credentials arrive
//! pre-hashed — hashing and session transport live outside this core.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::user as repo;
use crate::error::ServiceError;
use crate::models::enums::Role;
use crate::models::User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub(crate) fn create(conn: &Connection, new: NewUser) -> Result<User, ServiceError> {
    if new.username.trim().is_empty() {
        return Err(ServiceError::validation("username", "must not be empty"));
    }
    if new.email.trim().is_empty() {
        return Err(ServiceError::validation("email", "must not be empty"));
    }
    if repo::find_by_username(conn, &new.username)?.is_some() {
        return Err(ServiceError::validation(
            "username",
            format!("already taken: {}", new.username),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: new.username,
        email: new.email,
        password_hash: new.password_hash,
        role: new.role,
        is_active: true,
        created_at: Utc::now(),
    };
    repo::insert_user(conn, &user)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "staff account created");
    Ok(user)
}

pub(crate) fn set_active(
    conn: &Connection,
    user_id: &Uuid,
    active: bool,
) -> Result<User, ServiceError> {
    let mut user = repo::get_user(conn, user_id)?;
    user.is_active = active;
    repo::update_user(conn, &user)?;
    tracing::info!(user_id = %user.id, active, "staff account toggled");
    Ok(user)
}

pub(crate) fn assign_role(
    conn: &Connection,
    user_id: &Uuid,
    role: Role,
) -> Result<User, ServiceError> {
    let mut user = repo::get_user(conn, user_id)?;
    user.role = role;
    repo::update_user(conn, &user)?;
    tracing::info!(user_id = %user.id, role = role.as_str(), "staff role assigned");
    Ok(user)
}

pub(crate) fn list(conn: &Connection) -> Result<Vec<User>, ServiceError> {
    Ok(repo::list_users(conn)?)
}

pub(crate) fn find_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, ServiceError> {
    Ok(repo::find_by_username(conn, username)?)
}
