//! Referral pipeline.
//!
//! Validates and stores inbound webhook submissions, and drives referral
//! decisions. `ingest` is the one sanctioned unauthenticated entry point —
//! the payload contract is its entire trust boundary, so every field is
//! checked here and a failure names the offending field for the upstream
//! form-automation tool. Duplicate webhook deliveries are intentionally not
//! deduplicated: each creates its own pending referral, and duplicates are a
//! staff review-time concern.
//!
//! `decide(accept)` is the one place two aggregates are mutated together:
//! participant materialization, case opening, and the referral's terminal
//! transition commit in a single IMMEDIATE transaction or not at all.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cases;
use crate::db::repository::{participant as participant_repo, referral as referral_repo};
use crate::error::ServiceError;
use crate::gate::Actor;
use crate::models::enums::{ParticipantSource, ReferralStatus, UrgencyLevel};
use crate::models::filters::ReferralFilter;
use crate::models::{Participant, PersonProfile, Referral};
use crate::participants::{self, NewParticipant};

/// Raw webhook payload. Everything arrives as optional text; `ingest` decides
/// what is mandatory and how each present field must look.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub school_name: Option<String>,
    pub grade_level: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
    pub gender_identity: Option<String>,
    pub sex: Option<String>,
    pub pronouns: Option<String>,
    pub family_structure: Option<String>,
    pub allergies: Option<String>,
    pub illnesses_disabilities: Option<String>,
    pub primary_care_doctor: Option<String>,
    pub emergency_instructions: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub preferred_language: Option<String>,
    pub referrer_name: Option<String>,
    pub referrer_email: Option<String>,
    pub referrer_phone: Option<String>,
    pub referrer_organization: Option<String>,
    pub referrer_relationship: Option<String>,
    pub incident_date: Option<String>,
    pub incident_description: Option<String>,
    pub desired_outcome: Option<String>,
    pub previous_interventions: Option<String>,
    pub urgency_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Identity key used to link an accepted referral to an existing participant
/// instead of duplicating them. Which key is correct is a product decision,
/// so the policy is a parameter rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// First name + last name + exact date of birth. A referral without a
    /// birth date never matches and always creates a new participant.
    #[default]
    FirstLastDob,
    /// First name + last name only.
    FirstLastOnly,
}

/// What a decision produced. On accept both ids are set; on reject neither.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub referral: Referral,
    pub participant_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
}

/// Validate and persist a webhook submission as a pending referral.
///
/// Returns the new referral id. Fails with a field-naming `Validation` error
/// and persists nothing when the payload is malformed.
pub fn ingest(conn: &Connection, submission: &ReferralSubmission) -> Result<Uuid, ServiceError> {
    let first_name = required("first_name", &submission.first_name)?;
    let last_name = required("last_name", &submission.last_name)?;
    let referrer_name = required("referrer_name", &submission.referrer_name)?;
    let referrer_email = required("referrer_email", &submission.referrer_email)?;
    ensure_email("referrer_email", &referrer_email)?;

    let date_of_birth = opt_date("date_of_birth", &submission.date_of_birth)?;
    if let Some(dob) = date_of_birth {
        if dob > Utc::now().date_naive() {
            return Err(ServiceError::validation(
                "date_of_birth",
                "must not be in the future",
            ));
        }
    }
    let incident_date = opt_date("incident_date", &submission.incident_date)?;

    let urgency_level = match opt_text(&submission.urgency_level) {
        Some(s) => UrgencyLevel::from_str(&s)
            .map_err(|_| ServiceError::validation("urgency_level", format!("unknown value: {s}")))?,
        None => UrgencyLevel::Medium,
    };

    let profile = PersonProfile {
        phone: opt_phone("phone", &submission.phone)?,
        email: opt_email("email", &submission.email)?,
        street_address: opt_text(&submission.street_address),
        city: opt_text(&submission.city),
        state: opt_text(&submission.state),
        zip_code: opt_text(&submission.zip_code),
        emergency_contact_name: opt_text(&submission.emergency_contact_name),
        emergency_contact_phone: opt_phone(
            "emergency_contact_phone",
            &submission.emergency_contact_phone,
        )?,
        emergency_contact_relationship: opt_text(&submission.emergency_contact_relationship),
        school_name: opt_text(&submission.school_name),
        grade_level: opt_text(&submission.grade_level),
        race: opt_text(&submission.race),
        ethnicity: opt_text(&submission.ethnicity),
        gender_identity: opt_text(&submission.gender_identity),
        sex: opt_text(&submission.sex),
        pronouns: opt_text(&submission.pronouns),
        family_structure: opt_text(&submission.family_structure),
        allergies: opt_text(&submission.allergies),
        illnesses_disabilities: opt_text(&submission.illnesses_disabilities),
        primary_care_doctor: opt_text(&submission.primary_care_doctor),
        emergency_instructions: opt_text(&submission.emergency_instructions),
        preferred_contact_method: opt_text(&submission.preferred_contact_method),
        preferred_language: opt_text(&submission.preferred_language),
    };

    let referral = Referral {
        id: Uuid::new_v4(),
        participant_id: None,
        first_name,
        last_name,
        date_of_birth,
        profile,
        referrer_name,
        referrer_email,
        referrer_phone: opt_phone("referrer_phone", &submission.referrer_phone)?,
        referrer_organization: opt_text(&submission.referrer_organization),
        referrer_relationship: opt_text(&submission.referrer_relationship),
        incident_date,
        incident_description: opt_text(&submission.incident_description),
        desired_outcome: opt_text(&submission.desired_outcome),
        previous_interventions: opt_text(&submission.previous_interventions),
        urgency_level,
        status: ReferralStatus::Pending,
        rejection_reason: None,
        received_at: Utc::now(),
        decided_by: None,
        decided_at: None,
    };

    referral_repo::insert_referral(conn, &referral)?;
    tracing::info!(
        referral_id = %referral.id,
        urgency = urgency_level.as_str(),
        "referral ingested"
    );
    Ok(referral.id)
}

pub(crate) fn list(
    conn: &Connection,
    filter: &ReferralFilter,
) -> Result<Vec<Referral>, ServiceError> {
    Ok(referral_repo::list_referrals(conn, filter)?)
}

pub(crate) fn get(conn: &Connection, id: &Uuid) -> Result<Referral, ServiceError> {
    Ok(referral_repo::get_referral(conn, id)?)
}

/// Accept or reject a pending referral.
///
/// Accept materializes a participant (matched under `policy` or created with
/// `source=referral`), opens a case, and marks the referral accepted — all
/// inside one IMMEDIATE transaction. Two concurrent accepts of the same
/// referral serialize on the write lock; the loser re-reads a terminal
/// status and fails with `InvalidState`.
pub(crate) fn decide(
    conn: &mut Connection,
    referral_id: &Uuid,
    decision: Decision,
    actor: &Actor,
    reason: Option<String>,
    policy: MatchPolicy,
) -> Result<DecisionOutcome, ServiceError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut referral = referral_repo::get_referral(&tx, referral_id)?;
    if referral.status.is_terminal() {
        return Err(ServiceError::InvalidState(format!(
            "referral {} already {}",
            referral.id,
            referral.status.as_str()
        )));
    }

    let now = Utc::now();
    let outcome = match decision {
        Decision::Reject => {
            let reason = reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .ok_or_else(|| ServiceError::validation("reason", "required when rejecting"))?;

            referral.status = ReferralStatus::Rejected;
            referral.rejection_reason = Some(reason);
            referral.decided_by = Some(actor.user_id);
            referral.decided_at = Some(now);
            referral_repo::update_referral_decision(&tx, &referral)?;

            DecisionOutcome {
                referral,
                participant_id: None,
                case_id: None,
            }
        }
        Decision::Accept => {
            let participant = match find_match(&tx, &referral, policy)? {
                Some(existing) => {
                    tracing::info!(
                        referral_id = %referral.id,
                        participant_id = %existing.id,
                        "referral matched existing participant"
                    );
                    existing
                }
                None => materialize_participant(&tx, &referral)?,
            };

            let case = cases::open(&tx, &participant.id, None)?;

            referral.status = ReferralStatus::Accepted;
            referral.participant_id = Some(participant.id);
            referral.decided_by = Some(actor.user_id);
            referral.decided_at = Some(now);
            referral_repo::update_referral_decision(&tx, &referral)?;

            DecisionOutcome {
                referral,
                participant_id: Some(participant.id),
                case_id: Some(case.id),
            }
        }
    };

    tx.commit()?;
    tracing::info!(
        referral_id = %outcome.referral.id,
        status = outcome.referral.status.as_str(),
        decided_by = %actor.user_id,
        "referral decided"
    );
    Ok(outcome)
}

/// Administrator override: return a terminal referral to pending.
///
/// Deliberately outside the normal state machine. Clears the decision fields
/// and the participant link, but leaves any participant/case an earlier
/// accept created in place.
pub(crate) fn reopen(
    conn: &Connection,
    referral_id: &Uuid,
    actor: &Actor,
) -> Result<Referral, ServiceError> {
    let mut referral = referral_repo::get_referral(conn, referral_id)?;
    if !referral.status.is_terminal() {
        return Err(ServiceError::InvalidState(format!(
            "referral {} is still pending",
            referral.id
        )));
    }

    referral.status = ReferralStatus::Pending;
    referral.rejection_reason = None;
    referral.participant_id = None;
    referral.decided_by = None;
    referral.decided_at = None;
    referral_repo::update_referral_decision(conn, &referral)?;

    tracing::warn!(
        referral_id = %referral.id,
        actor = %actor.user_id,
        "terminal referral reverted to pending by administrator"
    );
    Ok(referral)
}

fn find_match(
    conn: &Connection,
    referral: &Referral,
    policy: MatchPolicy,
) -> Result<Option<Participant>, ServiceError> {
    let found = match policy {
        MatchPolicy::FirstLastDob => match referral.date_of_birth {
            Some(dob) => participant_repo::find_by_name_dob(
                conn,
                &referral.first_name,
                &referral.last_name,
                dob,
            )?,
            None => None,
        },
        MatchPolicy::FirstLastOnly => {
            participant_repo::find_by_name(conn, &referral.first_name, &referral.last_name)?
        }
    };
    Ok(found)
}

fn materialize_participant(
    conn: &Connection,
    referral: &Referral,
) -> Result<Participant, ServiceError> {
    participants::create(
        conn,
        NewParticipant {
            first_name: referral.first_name.clone(),
            last_name: referral.last_name.clone(),
            date_of_birth: referral.date_of_birth,
            profile: referral.profile.clone(),
            notes: referral.incident_description.clone(),
        },
        ParticipantSource::Referral,
    )
}

// ── Field validation ─────────────────────────────────────

fn required(field: &'static str, value: &Option<String>) -> Result<String, ServiceError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ServiceError::validation(field, "missing required field")),
    }
}

fn opt_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn ensure_email(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if email_regex().is_match(value) {
        Ok(())
    } else {
        Err(ServiceError::validation(field, format!("not a valid email address: {value}")))
    }
}

fn opt_email(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<String>, ServiceError> {
    match opt_text(value) {
        Some(v) => {
            ensure_email(field, &v)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

/// A phone field must normalize to 7-15 digits once separators and a leading
/// `+` are stripped. The value is stored as submitted.
fn opt_phone(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<String>, ServiceError> {
    let Some(v) = opt_text(value) else {
        return Ok(None);
    };
    let stripped = v.strip_prefix('+').unwrap_or(&v);
    let digits: String = stripped
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if digits.chars().all(|c| c.is_ascii_digit()) && (7..=15).contains(&digits.len()) {
        Ok(Some(v))
    } else {
        Err(ServiceError::validation(
            field,
            format!("not normalizable to a phone number: {v}"),
        ))
    }
}

fn opt_date(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<NaiveDate>, ServiceError> {
    match opt_text(value) {
        Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ServiceError::validation(field, format!("not a valid date (expected YYYY-MM-DD): {v}"))),
        None => Ok(None),
    }
}
