use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use rusqlite::{params, Connection, ToSql};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{CaseStatus, NoteKind};
use crate::models::filters::CaseFilter;
use crate::models::{Case, CaseNote};

use super::participant::parse_uuid;

const CASE_COLUMNS: &str = "id, participant_id, case_number, program_type, status, \
     outcome_notes, outcome_finalized, opened_at, closed_at";

pub fn insert_case(conn: &Connection, case: &Case) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO cases (id, participant_id, case_number, program_type, status,
         outcome_notes, outcome_finalized, opened_at, closed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            case.id.to_string(),
            case.participant_id.to_string(),
            case.case_number,
            case.program_type,
            case.status.as_str(),
            case.outcome_notes,
            case.outcome_finalized as i32,
            case.opened_at,
            case.closed_at,
        ],
    )?;
    Ok(())
}

pub fn get_case(conn: &Connection, id: &Uuid) -> Result<Case, DatabaseError> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id.to_string()], case_row)?;

    match rows.next() {
        Some(row) => case_from_row(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "case".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_cases(conn: &Connection, filter: &CaseFilter) -> Result<Vec<Case>, DatabaseError> {
    let mut sql = format!("SELECT {CASE_COLUMNS} FROM cases");
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Box::new(status.as_str()));
    }
    if let Some(participant_id) = filter.participant_id {
        clauses.push("participant_id = ?");
        values.push(Box::new(participant_id.to_string()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY opened_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), case_row)?;

    let mut cases = Vec::new();
    for row in rows {
        cases.push(case_from_row(row?)?);
    }
    Ok(cases)
}

/// Write the lifecycle fields of a case. Status and closure data move
/// together so `closed_at` can never disagree with the status column.
pub fn update_case_state(conn: &Connection, case: &Case) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE cases SET program_type = ?2, status = ?3, outcome_notes = ?4,
         outcome_finalized = ?5, closed_at = ?6 WHERE id = ?1",
        params![
            case.id.to_string(),
            case.program_type,
            case.status.as_str(),
            case.outcome_notes,
            case.outcome_finalized as i32,
            case.closed_at,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "case".into(),
            id: case.id.to_string(),
        });
    }
    Ok(())
}

/// Next sequence number for `RJ-<year>-NNNN` case numbers.
pub fn next_case_sequence(conn: &Connection, now: DateTime<Utc>) -> Result<i64, DatabaseError> {
    let prefix = format!("RJ-{}-%", now.year());
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cases WHERE case_number LIKE ?1",
        params![prefix],
        |row| row.get(0),
    )?;
    Ok(count + 1)
}

pub fn count_cases(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
    Ok(count)
}

// ── Case notes ───────────────────────────────────────────

pub fn insert_case_note(conn: &Connection, note: &CaseNote) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO case_notes (id, case_id, author_id, kind, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            note.id.to_string(),
            note.case_id.to_string(),
            note.author_id.to_string(),
            note.kind.as_str(),
            note.text,
            note.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_case_notes(conn: &Connection, case_id: &Uuid) -> Result<Vec<CaseNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, case_id, author_id, kind, text, created_at
         FROM case_notes WHERE case_id = ?1 ORDER BY created_at",
    )?;

    let rows = stmt.query_map(params![case_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, DateTime<Utc>>(5)?,
        ))
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let (id, case_id, author_id, kind, text, created_at) = row?;
        notes.push(CaseNote {
            id: parse_uuid(&id)?,
            case_id: parse_uuid(&case_id)?,
            author_id: parse_uuid(&author_id)?,
            kind: NoteKind::from_str(&kind)?,
            text,
            created_at,
        });
    }
    Ok(notes)
}

// ── Row mapping ──────────────────────────────────────────

struct CaseRow {
    id: String,
    participant_id: String,
    case_number: String,
    program_type: Option<String>,
    status: String,
    outcome_notes: Option<String>,
    outcome_finalized: i32,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

fn case_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaseRow> {
    Ok(CaseRow {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        case_number: row.get(2)?,
        program_type: row.get(3)?,
        status: row.get(4)?,
        outcome_notes: row.get(5)?,
        outcome_finalized: row.get(6)?,
        opened_at: row.get(7)?,
        closed_at: row.get(8)?,
    })
}

fn case_from_row(row: CaseRow) -> Result<Case, DatabaseError> {
    Ok(Case {
        id: parse_uuid(&row.id)?,
        participant_id: parse_uuid(&row.participant_id)?,
        case_number: row.case_number,
        program_type: row.program_type,
        status: CaseStatus::from_str(&row.status)?,
        outcome_notes: row.outcome_notes,
        outcome_finalized: row.outcome_finalized != 0,
        opened_at: row.opened_at,
        closed_at: row.closed_at,
    })
}
