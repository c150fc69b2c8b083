use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::User;

use super::participant::parse_uuid;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, role, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.is_active as i32,
            user.created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("username taken: {}", user.username))
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<User, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, role, is_active, created_at
         FROM users WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], user_row)?;

    match rows.next() {
        Some(row) => user_from_row(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        }),
    }
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, role, is_active, created_at
         FROM users WHERE username = ?1",
    )?;
    let mut rows = stmt.query_map(params![username], user_row)?;

    match rows.next() {
        Some(row) => Ok(Some(user_from_row(row?)?)),
        None => Ok(None),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, role, is_active, created_at
         FROM users ORDER BY username",
    )?;
    let rows = stmt.query_map([], user_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET email = ?2, password_hash = ?3, role = ?4, is_active = ?5 WHERE id = ?1",
        params![
            user.id.to_string(),
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.is_active as i32,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user.id.to_string(),
        });
    }
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────

struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: i32,
    created_at: DateTime<Utc>,
}

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        role: Role::from_str(&row.role)?,
        is_active: row.is_active != 0,
        created_at: row.created_at,
    })
}
