use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ToSql};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ParticipantSource;
use crate::models::filters::ParticipantFilter;
use crate::models::{ImportantPerson, Participant};

use super::{placeholders, profile_from_row, push_profile_params, PROFILE_COLUMNS, PROFILE_COLUMN_COUNT};

fn select_columns() -> String {
    format!("id, first_name, last_name, date_of_birth, {PROFILE_COLUMNS}, notes, source, created_at, updated_at")
}

pub fn insert_participant(conn: &Connection, p: &Participant) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO participants ({}) VALUES ({})",
        select_columns(),
        placeholders(PROFILE_COLUMN_COUNT + 8),
    );

    let id = p.id.to_string();
    let source = p.source.as_str();
    let mut values: Vec<&dyn ToSql> = vec![&id, &p.first_name, &p.last_name, &p.date_of_birth];
    push_profile_params(&mut values, &p.profile);
    values.extend_from_slice(&[&p.notes, &source, &p.created_at, &p.updated_at]);

    conn.execute(&sql, values.as_slice())?;
    Ok(())
}

/// Full-row update. The field-level merge happens in the participant store;
/// by the time a row reaches here it is the complete intended state.
pub fn update_participant(conn: &Connection, p: &Participant) -> Result<(), DatabaseError> {
    let sql = format!(
        "UPDATE participants SET first_name = ?2, last_name = ?3, date_of_birth = ?4, \
         phone = ?5, email = ?6, street_address = ?7, city = ?8, state = ?9, zip_code = ?10, \
         emergency_contact_name = ?11, emergency_contact_phone = ?12, \
         emergency_contact_relationship = ?13, school_name = ?14, grade_level = ?15, \
         race = ?16, ethnicity = ?17, gender_identity = ?18, sex = ?19, pronouns = ?20, \
         family_structure = ?21, allergies = ?22, illnesses_disabilities = ?23, \
         primary_care_doctor = ?24, emergency_instructions = ?25, \
         preferred_contact_method = ?26, preferred_language = ?27, notes = ?28, \
         updated_at = ?29 WHERE id = ?1",
    );

    let id = p.id.to_string();
    let mut values: Vec<&dyn ToSql> = vec![&id, &p.first_name, &p.last_name, &p.date_of_birth];
    push_profile_params(&mut values, &p.profile);
    values.extend_from_slice(&[&p.notes, &p.updated_at]);

    let updated = conn.execute(&sql, values.as_slice())?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "participant".into(),
            id: p.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_participant(conn: &Connection, id: &Uuid) -> Result<Participant, DatabaseError> {
    let sql = format!("SELECT {} FROM participants WHERE id = ?1", select_columns());
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id.to_string()], participant_row)?;

    match rows.next() {
        Some(row) => participant_from_row(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "participant".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_participants(
    conn: &Connection,
    filter: &ParticipantFilter,
) -> Result<Vec<Participant>, DatabaseError> {
    let mut sql = format!("SELECT {} FROM participants", select_columns());
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(name) = &filter.name {
        clauses.push("(LOWER(first_name) LIKE LOWER(?) OR LOWER(last_name) LIKE LOWER(?))");
        let pattern = format!("%{name}%");
        values.push(Box::new(pattern.clone()));
        values.push(Box::new(pattern));
    }
    if let Some(source) = filter.source {
        clauses.push("source = ?");
        values.push(Box::new(source.as_str()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY last_name, first_name");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), participant_row)?;

    let mut participants = Vec::new();
    for row in rows {
        participants.push(participant_from_row(row?)?);
    }
    Ok(participants)
}

/// Exact identity match on name + date of birth (case-insensitive names).
/// A stored participant without a birth date never matches here.
pub fn find_by_name_dob(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    date_of_birth: NaiveDate,
) -> Result<Option<Participant>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM participants \
         WHERE LOWER(first_name) = LOWER(?1) AND LOWER(last_name) = LOWER(?2) \
         AND date_of_birth = ?3 ORDER BY created_at LIMIT 1",
        select_columns(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![first_name, last_name, date_of_birth], participant_row)?;

    match rows.next() {
        Some(row) => Ok(Some(participant_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Identity match on name alone (case-insensitive).
pub fn find_by_name(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<Option<Participant>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM participants \
         WHERE LOWER(first_name) = LOWER(?1) AND LOWER(last_name) = LOWER(?2) \
         ORDER BY created_at LIMIT 1",
        select_columns(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![first_name, last_name], participant_row)?;

    match rows.next() {
        Some(row) => Ok(Some(participant_from_row(row?)?)),
        None => Ok(None),
    }
}

pub fn count_participants(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))?;
    Ok(count)
}

// ── Important persons ────────────────────────────────────

pub fn insert_important_person(
    conn: &Connection,
    person: &ImportantPerson,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO important_persons (id, participant_id, name, relationship, phone, email, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            person.id.to_string(),
            person.participant_id.to_string(),
            person.name,
            person.relationship,
            person.phone,
            person.email,
            person.notes,
            person.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_important_persons(
    conn: &Connection,
    participant_id: &Uuid,
) -> Result<Vec<ImportantPerson>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, participant_id, name, relationship, phone, email, notes, created_at
         FROM important_persons WHERE participant_id = ?1 ORDER BY created_at",
    )?;

    let rows = stmt.query_map(params![participant_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, DateTime<Utc>>(7)?,
        ))
    })?;

    let mut persons = Vec::new();
    for row in rows {
        let (id, participant_id, name, relationship, phone, email, notes, created_at) = row?;
        persons.push(ImportantPerson {
            id: parse_uuid(&id)?,
            participant_id: parse_uuid(&participant_id)?,
            name,
            relationship,
            phone,
            email,
            notes,
            created_at,
        });
    }
    Ok(persons)
}

pub fn delete_important_person(
    conn: &Connection,
    participant_id: &Uuid,
    person_id: &Uuid,
) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM important_persons WHERE id = ?1 AND participant_id = ?2",
        params![person_id.to_string(), participant_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "important_person".into(),
            id: person_id.to_string(),
        });
    }
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────

struct ParticipantRow {
    id: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    profile: crate::models::PersonProfile,
    notes: Option<String>,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn participant_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParticipantRow> {
    Ok(ParticipantRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        profile: profile_from_row(row, 4)?,
        notes: row.get(4 + PROFILE_COLUMN_COUNT)?,
        source: row.get(5 + PROFILE_COLUMN_COUNT)?,
        created_at: row.get(6 + PROFILE_COLUMN_COUNT)?,
        updated_at: row.get(7 + PROFILE_COLUMN_COUNT)?,
    })
}

fn participant_from_row(row: ParticipantRow) -> Result<Participant, DatabaseError> {
    Ok(Participant {
        id: parse_uuid(&row.id)?,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: row.date_of_birth,
        profile: row.profile,
        notes: row.notes,
        source: ParticipantSource::from_str(&row.source)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
