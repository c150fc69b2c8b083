//! End-to-end referral workflow: webhook ingestion through staff decision,
//! case work, and closure.

use circlekeeper::db::open_memory_database;
use circlekeeper::gate::{AccessGate, Actor};
use circlekeeper::intake::{self, Decision, ReferralSubmission};
use circlekeeper::models::enums::{
    CaseStatus, NoteKind, ParticipantSource, ReferralStatus, Role, UrgencyLevel,
};
use circlekeeper::models::filters::{CaseFilter, ReferralFilter};
use uuid::Uuid;

fn actor(role: Role) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role,
    }
}

fn submission() -> ReferralSubmission {
    ReferralSubmission {
        first_name: Some("Jordan".into()),
        last_name: Some("Reyes".into()),
        date_of_birth: Some("2009-04-12".into()),
        phone: Some("555-010-0199".into()),
        referrer_name: Some("Sam Okafor".into()),
        referrer_email: Some("sam@school.example.org".into()),
        referrer_organization: Some("Lincoln Middle School".into()),
        incident_description: Some("Dispute after class escalated".into()),
        urgency_level: Some("high".into()),
        ..Default::default()
    }
}

#[test]
fn referral_to_closed_case() {
    let mut conn = open_memory_database().unwrap();
    let coordinator = actor(Role::Coordinator);
    let volunteer = actor(Role::Volunteer);

    // Webhook delivery lands as a pending referral.
    let referral_id = intake::ingest(&conn, &submission()).unwrap();

    let mut gate = AccessGate::new(&mut conn);
    let pending = gate
        .list_referrals(
            &coordinator,
            &ReferralFilter {
                status: Some(ReferralStatus::Pending),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].urgency_level, UrgencyLevel::High);

    // Coordinator accepts: participant + case appear atomically.
    let outcome = gate
        .decide_referral(&coordinator, &referral_id, Decision::Accept, None)
        .unwrap();
    let participant_id = outcome.participant_id.unwrap();
    let case_id = outcome.case_id.unwrap();

    // A volunteer can read the participant record but nothing else.
    let participant = gate.get_participant(&volunteer, &participant_id).unwrap();
    assert_eq!(participant.full_name(), "Jordan Reyes");
    assert_eq!(participant.source, ParticipantSource::Referral);
    assert_eq!(
        participant.notes.as_deref(),
        Some("Dispute after class escalated")
    );
    assert!(gate.get_case(&volunteer, &case_id).is_err());

    // Coordinator works the case to completion.
    gate.assign_case_program(&coordinator, &case_id, "restorative circle".into())
        .unwrap();
    gate.advance_case(&coordinator, &case_id, CaseStatus::InProgress)
        .unwrap();
    gate.add_case_note(
        &coordinator,
        &case_id,
        NoteKind::Meeting,
        "pre-conference with both families".into(),
    )
    .unwrap();
    let closed = gate
        .close_case(
            &coordinator,
            &case_id,
            Some("agreement reached and fulfilled".into()),
        )
        .unwrap();
    assert_eq!(closed.status, CaseStatus::Closed);
    assert!(closed.outcome_finalized);
    assert!(closed.closed_at.is_some());

    let notes = gate.list_case_notes(&coordinator, &case_id).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].author_id, coordinator.user_id);

    let for_participant = gate
        .list_cases(
            &coordinator,
            &CaseFilter {
                participant_id: Some(participant_id),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(for_participant.len(), 1);
}

#[test]
fn rejected_referral_leaves_no_trace_and_can_be_reopened() {
    let mut conn = open_memory_database().unwrap();
    let coordinator = actor(Role::Coordinator);
    let admin = actor(Role::Administrator);

    let referral_id = intake::ingest(&conn, &submission()).unwrap();
    let mut gate = AccessGate::new(&mut conn);

    let outcome = gate
        .decide_referral(
            &coordinator,
            &referral_id,
            Decision::Reject,
            Some("family declined to participate".into()),
        )
        .unwrap();
    assert_eq!(outcome.referral.status, ReferralStatus::Rejected);
    assert!(outcome.participant_id.is_none());
    assert!(outcome.case_id.is_none());

    // Administrator reverses the decision; referral is decidable again.
    let reverted = gate.reopen_referral(&admin, &referral_id).unwrap();
    assert_eq!(reverted.status, ReferralStatus::Pending);

    let outcome = gate
        .decide_referral(&coordinator, &referral_id, Decision::Accept, None)
        .unwrap();
    assert_eq!(outcome.referral.status, ReferralStatus::Accepted);
    assert!(outcome.case_id.is_some());
}

#[test]
fn volunteer_gets_nothing_but_participant_views() {
    let mut conn = open_memory_database().unwrap();
    let volunteer = actor(Role::Volunteer);

    let referral_id = intake::ingest(&conn, &submission()).unwrap();
    let mut gate = AccessGate::new(&mut conn);

    assert!(gate
        .list_referrals(&volunteer, &ReferralFilter::default())
        .is_err());
    assert!(gate
        .decide_referral(&volunteer, &referral_id, Decision::Accept, None)
        .is_err());
    assert!(gate.list_users(&volunteer).is_err());

    // The denied accept left no partial state behind.
    let coordinator = actor(Role::Coordinator);
    let still_pending = gate.get_referral(&coordinator, &referral_id).unwrap();
    assert_eq!(still_pending.status, ReferralStatus::Pending);
}
