//! Case lifecycle.
//!
//! A case tracks service delivery for a participant from opening to closure.
//! Status moves through a fixed graph:
//!
//! ```text
//! open → in_progress → { on_hold, closed }
//! on_hold → in_progress
//! closed → in_progress   (reopen; clears closed_at and the outcome flag)
//! ```
//!
//! The explicit `close` action is legal from any non-closed status; only the
//! step-wise `advance` is restricted to the graph above. `closed_at` is set
//! iff the status is `closed`.

use chrono::{Datelike, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{case as repo, participant as participant_repo};
use crate::error::ServiceError;
use crate::models::enums::{CaseStatus, NoteKind};
use crate::models::filters::CaseFilter;
use crate::models::{Case, CaseNote};

pub(crate) fn open(
    conn: &Connection,
    participant_id: &Uuid,
    program_type: Option<String>,
) -> Result<Case, ServiceError> {
    participant_repo::get_participant(conn, participant_id)?;

    let now = Utc::now();
    let sequence = repo::next_case_sequence(conn, now)?;
    let case = Case {
        id: Uuid::new_v4(),
        participant_id: *participant_id,
        case_number: format!("RJ-{}-{:04}", now.year(), sequence),
        program_type,
        status: CaseStatus::Open,
        outcome_notes: None,
        outcome_finalized: false,
        opened_at: now,
        closed_at: None,
    };
    repo::insert_case(conn, &case)?;
    tracing::info!(case_id = %case.id, case_number = %case.case_number, "case opened");
    Ok(case)
}

pub(crate) fn get(conn: &Connection, id: &Uuid) -> Result<Case, ServiceError> {
    Ok(repo::get_case(conn, id)?)
}

pub(crate) fn list(conn: &Connection, filter: &CaseFilter) -> Result<Vec<Case>, ServiceError> {
    Ok(repo::list_cases(conn, filter)?)
}

/// Move a case one step along the transition graph.
pub(crate) fn advance(
    conn: &Connection,
    case_id: &Uuid,
    new_status: CaseStatus,
) -> Result<Case, ServiceError> {
    let mut case = repo::get_case(conn, case_id)?;

    if !transition_legal(case.status, new_status) {
        return Err(ServiceError::InvalidState(format!(
            "case {} cannot move {} -> {}",
            case.case_number,
            case.status.as_str(),
            new_status.as_str()
        )));
    }

    let from = case.status;
    case.status = new_status;
    match new_status {
        CaseStatus::Closed => {
            case.closed_at = Some(Utc::now());
            case.outcome_finalized = true;
        }
        CaseStatus::InProgress if from == CaseStatus::Closed => {
            // Reopen
            case.closed_at = None;
            case.outcome_finalized = false;
        }
        _ => {}
    }
    repo::update_case_state(conn, &case)?;
    tracing::info!(
        case_id = %case.id,
        from = from.as_str(),
        to = new_status.as_str(),
        "case advanced"
    );
    Ok(case)
}

/// Close a case from any non-closed status, optionally recording outcome
/// notes.
pub(crate) fn close(
    conn: &Connection,
    case_id: &Uuid,
    outcome_notes: Option<String>,
) -> Result<Case, ServiceError> {
    let mut case = repo::get_case(conn, case_id)?;
    if case.status == CaseStatus::Closed {
        return Err(ServiceError::InvalidState(format!(
            "case {} is already closed",
            case.case_number
        )));
    }

    let outcome_notes = match outcome_notes {
        Some(notes) => {
            let notes = notes.trim().to_string();
            if notes.is_empty() {
                return Err(ServiceError::validation(
                    "outcome_notes",
                    "must not be empty when provided",
                ));
            }
            Some(notes)
        }
        None => None,
    };

    case.status = CaseStatus::Closed;
    case.outcome_notes = outcome_notes;
    case.outcome_finalized = true;
    case.closed_at = Some(Utc::now());
    repo::update_case_state(conn, &case)?;
    tracing::info!(case_id = %case.id, "case closed");
    Ok(case)
}

pub(crate) fn assign_program(
    conn: &Connection,
    case_id: &Uuid,
    program_type: String,
) -> Result<Case, ServiceError> {
    if program_type.trim().is_empty() {
        return Err(ServiceError::validation("program_type", "must not be empty"));
    }
    let mut case = repo::get_case(conn, case_id)?;
    case.program_type = Some(program_type);
    repo::update_case_state(conn, &case)?;
    Ok(case)
}

/// Append an immutable note to a case.
pub(crate) fn add_note(
    conn: &Connection,
    case_id: &Uuid,
    author_id: &Uuid,
    kind: NoteKind,
    text: String,
) -> Result<CaseNote, ServiceError> {
    if text.trim().is_empty() {
        return Err(ServiceError::validation("text", "must not be empty"));
    }
    repo::get_case(conn, case_id)?;

    let note = CaseNote {
        id: Uuid::new_v4(),
        case_id: *case_id,
        author_id: *author_id,
        kind,
        text,
        created_at: Utc::now(),
    };
    repo::insert_case_note(conn, &note)?;
    Ok(note)
}

pub(crate) fn notes(conn: &Connection, case_id: &Uuid) -> Result<Vec<CaseNote>, ServiceError> {
    repo::get_case(conn, case_id)?;
    Ok(repo::list_case_notes(conn, case_id)?)
}

fn transition_legal(from: CaseStatus, to: CaseStatus) -> bool {
    matches!(
        (from, to),
        (CaseStatus::Open, CaseStatus::InProgress)
            | (CaseStatus::InProgress, CaseStatus::OnHold)
            | (CaseStatus::InProgress, CaseStatus::Closed)
            | (CaseStatus::OnHold, CaseStatus::InProgress)
            | (CaseStatus::Closed, CaseStatus::InProgress)
    )
}
