use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ToSql};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ReferralStatus, UrgencyLevel};
use crate::models::filters::ReferralFilter;
use crate::models::{PersonProfile, Referral};

use super::participant::parse_uuid;
use super::{placeholders, profile_from_row, push_profile_params, PROFILE_COLUMNS, PROFILE_COLUMN_COUNT};

fn select_columns() -> String {
    format!(
        "id, participant_id, first_name, last_name, date_of_birth, {PROFILE_COLUMNS}, \
         referrer_name, referrer_email, referrer_phone, referrer_organization, \
         referrer_relationship, incident_date, incident_description, desired_outcome, \
         previous_interventions, urgency_level, status, rejection_reason, received_at, \
         decided_by, decided_at"
    )
}

pub fn insert_referral(conn: &Connection, r: &Referral) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO referrals ({}) VALUES ({})",
        select_columns(),
        placeholders(PROFILE_COLUMN_COUNT + 20),
    );

    let id = r.id.to_string();
    let participant_id = r.participant_id.map(|id| id.to_string());
    let urgency = r.urgency_level.as_str();
    let status = r.status.as_str();
    let decided_by = r.decided_by.map(|id| id.to_string());

    let mut values: Vec<&dyn ToSql> = vec![
        &id,
        &participant_id,
        &r.first_name,
        &r.last_name,
        &r.date_of_birth,
    ];
    push_profile_params(&mut values, &r.profile);
    values.extend_from_slice(&[
        &r.referrer_name,
        &r.referrer_email,
        &r.referrer_phone,
        &r.referrer_organization,
        &r.referrer_relationship,
        &r.incident_date,
        &r.incident_description,
        &r.desired_outcome,
        &r.previous_interventions,
        &urgency,
        &status,
        &r.rejection_reason,
        &r.received_at,
        &decided_by,
        &r.decided_at,
    ]);

    conn.execute(&sql, values.as_slice())?;
    Ok(())
}

pub fn get_referral(conn: &Connection, id: &Uuid) -> Result<Referral, DatabaseError> {
    let sql = format!("SELECT {} FROM referrals WHERE id = ?1", select_columns());
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id.to_string()], referral_row)?;

    match rows.next() {
        Some(row) => referral_from_row(row?),
        None => Err(DatabaseError::NotFound {
            entity_type: "referral".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_referrals(
    conn: &Connection,
    filter: &ReferralFilter,
) -> Result<Vec<Referral>, DatabaseError> {
    let mut sql = format!("SELECT {} FROM referrals", select_columns());
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Box::new(status.as_str()));
    }
    if let Some(urgency) = filter.urgency {
        clauses.push("urgency_level = ?");
        values.push(Box::new(urgency.as_str()));
    }
    if let Some(from) = filter.received_from {
        clauses.push("date(received_at) >= ?");
        values.push(Box::new(from));
    }
    if let Some(to) = filter.received_to {
        clauses.push("date(received_at) <= ?");
        values.push(Box::new(to));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY received_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), referral_row)?;

    let mut referrals = Vec::new();
    for row in rows {
        referrals.push(referral_from_row(row?)?);
    }
    Ok(referrals)
}

/// Write the decision fields of a referral. Status/reason/link/decider move
/// together so a referral can never be half-decided on disk.
pub fn update_referral_decision(conn: &Connection, r: &Referral) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE referrals SET status = ?2, rejection_reason = ?3, participant_id = ?4,
         decided_by = ?5, decided_at = ?6 WHERE id = ?1",
        params![
            r.id.to_string(),
            r.status.as_str(),
            r.rejection_reason,
            r.participant_id.map(|id| id.to_string()),
            r.decided_by.map(|id| id.to_string()),
            r.decided_at,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "referral".into(),
            id: r.id.to_string(),
        });
    }
    Ok(())
}

pub fn count_referrals(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM referrals", [], |row| row.get(0))?;
    Ok(count)
}

// ── Row mapping ──────────────────────────────────────────

struct ReferralRow {
    id: String,
    participant_id: Option<String>,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    profile: PersonProfile,
    referrer_name: String,
    referrer_email: String,
    referrer_phone: Option<String>,
    referrer_organization: Option<String>,
    referrer_relationship: Option<String>,
    incident_date: Option<NaiveDate>,
    incident_description: Option<String>,
    desired_outcome: Option<String>,
    previous_interventions: Option<String>,
    urgency_level: String,
    status: String,
    rejection_reason: Option<String>,
    received_at: DateTime<Utc>,
    decided_by: Option<String>,
    decided_at: Option<DateTime<Utc>>,
}

fn referral_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferralRow> {
    let base = 5 + PROFILE_COLUMN_COUNT;
    Ok(ReferralRow {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        profile: profile_from_row(row, 5)?,
        referrer_name: row.get(base)?,
        referrer_email: row.get(base + 1)?,
        referrer_phone: row.get(base + 2)?,
        referrer_organization: row.get(base + 3)?,
        referrer_relationship: row.get(base + 4)?,
        incident_date: row.get(base + 5)?,
        incident_description: row.get(base + 6)?,
        desired_outcome: row.get(base + 7)?,
        previous_interventions: row.get(base + 8)?,
        urgency_level: row.get(base + 9)?,
        status: row.get(base + 10)?,
        rejection_reason: row.get(base + 11)?,
        received_at: row.get(base + 12)?,
        decided_by: row.get(base + 13)?,
        decided_at: row.get(base + 14)?,
    })
}

fn referral_from_row(row: ReferralRow) -> Result<Referral, DatabaseError> {
    Ok(Referral {
        id: parse_uuid(&row.id)?,
        participant_id: row.participant_id.as_deref().map(parse_uuid).transpose()?,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: row.date_of_birth,
        profile: row.profile,
        referrer_name: row.referrer_name,
        referrer_email: row.referrer_email,
        referrer_phone: row.referrer_phone,
        referrer_organization: row.referrer_organization,
        referrer_relationship: row.referrer_relationship,
        incident_date: row.incident_date,
        incident_description: row.incident_description,
        desired_outcome: row.desired_outcome,
        previous_interventions: row.previous_interventions,
        urgency_level: UrgencyLevel::from_str(&row.urgency_level)?,
        status: ReferralStatus::from_str(&row.status)?,
        rejection_reason: row.rejection_reason,
        received_at: row.received_at,
        decided_by: row.decided_by.as_deref().map(parse_uuid).transpose()?,
        decided_at: row.decided_at,
    })
}
