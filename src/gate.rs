//! Access gate — the single authorization choke point.
//!
//! Every staff-originated operation enters through a method here; the
//! underlying services are `pub(crate)` and unreachable from outside the
//! crate except via this gate (the webhook's `intake::ingest` is the one
//! sanctioned bypass, since no staff session exists for that caller).
//! Centralizing the checks keeps a new code path from shipping without one.
//!
//! The caller's role and identity are explicit arguments on every call —
//! there is no ambient session state. On denial the underlying operation is
//! never invoked, so a denied call has no side effects.

use rusqlite::Connection;
use uuid::Uuid;

use crate::cases;
use crate::error::ServiceError;
use crate::intake::{self, Decision, DecisionOutcome, MatchPolicy};
use crate::models::enums::{CaseStatus, NoteKind, Role};
use crate::models::filters::{CaseFilter, ParticipantFilter, ReferralFilter};
use crate::models::{Case, CaseNote, ImportantPerson, Participant, Referral, User};
use crate::participants::{self, NewParticipant, ParticipantUpdate};
use crate::permissions::{can, Action};
use crate::users::{self, NewUser};

/// Authenticated staff caller: who they are and what role they hold.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

pub struct AccessGate<'a> {
    conn: &'a mut Connection,
    match_policy: MatchPolicy,
}

impl<'a> AccessGate<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self {
            conn,
            match_policy: MatchPolicy::default(),
        }
    }

    /// Override the participant-identity match policy used when accepting
    /// referrals.
    pub fn with_match_policy(conn: &'a mut Connection, match_policy: MatchPolicy) -> Self {
        Self { conn, match_policy }
    }

    fn authorize(&self, actor: &Actor, action: Action) -> Result<(), ServiceError> {
        if can(actor.role, action) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %actor.user_id,
                role = actor.role.as_str(),
                action = action.as_str(),
                "permission denied"
            );
            Err(ServiceError::PermissionDenied {
                role: actor.role,
                action,
            })
        }
    }

    // ── Participants ─────────────────────────────────────

    pub fn create_participant(
        &mut self,
        actor: &Actor,
        new: NewParticipant,
    ) -> Result<Participant, ServiceError> {
        self.authorize(actor, Action::EditParticipant)?;
        participants::create(
            self.conn,
            new,
            crate::models::enums::ParticipantSource::Manual,
        )
    }

    pub fn get_participant(&self, actor: &Actor, id: &Uuid) -> Result<Participant, ServiceError> {
        self.authorize(actor, Action::ViewParticipant)?;
        participants::get(self.conn, id)
    }

    pub fn list_participants(
        &self,
        actor: &Actor,
        filter: &ParticipantFilter,
    ) -> Result<Vec<Participant>, ServiceError> {
        self.authorize(actor, Action::ViewParticipant)?;
        participants::list(self.conn, filter)
    }

    pub fn update_participant(
        &mut self,
        actor: &Actor,
        id: &Uuid,
        update: ParticipantUpdate,
    ) -> Result<Participant, ServiceError> {
        self.authorize(actor, Action::EditParticipant)?;
        participants::update(self.conn, id, update)
    }

    pub fn add_important_person(
        &mut self,
        actor: &Actor,
        participant_id: &Uuid,
        name: String,
        relationship: String,
        phone: Option<String>,
        email: Option<String>,
        notes: Option<String>,
    ) -> Result<ImportantPerson, ServiceError> {
        self.authorize(actor, Action::EditParticipant)?;
        participants::add_important_person(
            self.conn,
            participant_id,
            name,
            relationship,
            phone,
            email,
            notes,
        )
    }

    pub fn list_important_persons(
        &self,
        actor: &Actor,
        participant_id: &Uuid,
    ) -> Result<Vec<ImportantPerson>, ServiceError> {
        self.authorize(actor, Action::ViewParticipant)?;
        participants::important_persons(self.conn, participant_id)
    }

    pub fn remove_important_person(
        &mut self,
        actor: &Actor,
        participant_id: &Uuid,
        person_id: &Uuid,
    ) -> Result<(), ServiceError> {
        self.authorize(actor, Action::EditParticipant)?;
        participants::remove_important_person(self.conn, participant_id, person_id)
    }

    // ── Referrals ────────────────────────────────────────

    pub fn list_referrals(
        &self,
        actor: &Actor,
        filter: &ReferralFilter,
    ) -> Result<Vec<Referral>, ServiceError> {
        self.authorize(actor, Action::DecideReferral)?;
        intake::list(self.conn, filter)
    }

    pub fn get_referral(&self, actor: &Actor, id: &Uuid) -> Result<Referral, ServiceError> {
        self.authorize(actor, Action::DecideReferral)?;
        intake::get(self.conn, id)
    }

    pub fn decide_referral(
        &mut self,
        actor: &Actor,
        referral_id: &Uuid,
        decision: Decision,
        reason: Option<String>,
    ) -> Result<DecisionOutcome, ServiceError> {
        self.authorize(actor, Action::DecideReferral)?;
        intake::decide(
            self.conn,
            referral_id,
            decision,
            actor,
            reason,
            self.match_policy,
        )
    }

    /// Administrator override: revert a terminal referral to pending.
    /// Held to the user-management tier, not the ordinary decide capability.
    pub fn reopen_referral(
        &mut self,
        actor: &Actor,
        referral_id: &Uuid,
    ) -> Result<Referral, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        intake::reopen(self.conn, referral_id, actor)
    }

    // ── Cases ────────────────────────────────────────────

    pub fn open_case(
        &mut self,
        actor: &Actor,
        participant_id: &Uuid,
        program_type: Option<String>,
    ) -> Result<Case, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::open(self.conn, participant_id, program_type)
    }

    pub fn get_case(&self, actor: &Actor, id: &Uuid) -> Result<Case, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::get(self.conn, id)
    }

    pub fn list_cases(
        &self,
        actor: &Actor,
        filter: &CaseFilter,
    ) -> Result<Vec<Case>, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::list(self.conn, filter)
    }

    pub fn advance_case(
        &mut self,
        actor: &Actor,
        case_id: &Uuid,
        new_status: CaseStatus,
    ) -> Result<Case, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::advance(self.conn, case_id, new_status)
    }

    pub fn close_case(
        &mut self,
        actor: &Actor,
        case_id: &Uuid,
        outcome_notes: Option<String>,
    ) -> Result<Case, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::close(self.conn, case_id, outcome_notes)
    }

    pub fn assign_case_program(
        &mut self,
        actor: &Actor,
        case_id: &Uuid,
        program_type: String,
    ) -> Result<Case, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::assign_program(self.conn, case_id, program_type)
    }

    pub fn add_case_note(
        &mut self,
        actor: &Actor,
        case_id: &Uuid,
        kind: NoteKind,
        text: String,
    ) -> Result<CaseNote, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::add_note(self.conn, case_id, &actor.user_id, kind, text)
    }

    pub fn list_case_notes(
        &self,
        actor: &Actor,
        case_id: &Uuid,
    ) -> Result<Vec<CaseNote>, ServiceError> {
        self.authorize(actor, Action::ManageCase)?;
        cases::notes(self.conn, case_id)
    }

    // ── Users ────────────────────────────────────────────

    pub fn create_user(&mut self, actor: &Actor, new: NewUser) -> Result<User, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        users::create(self.conn, new)
    }

    pub fn set_user_active(
        &mut self,
        actor: &Actor,
        user_id: &Uuid,
        active: bool,
    ) -> Result<User, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        users::set_active(self.conn, user_id, active)
    }

    pub fn assign_role(
        &mut self,
        actor: &Actor,
        user_id: &Uuid,
        role: Role,
    ) -> Result<User, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        users::assign_role(self.conn, user_id, role)
    }

    pub fn list_users(&self, actor: &Actor) -> Result<Vec<User>, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        users::list(self.conn)
    }

    pub fn find_user_by_username(
        &self,
        actor: &Actor,
        username: &str,
    ) -> Result<Option<User>, ServiceError> {
        self.authorize(actor, Action::ManageUsers)?;
        users::find_by_username(self.conn, username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::participant::count_participants;

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn new_participant() -> NewParticipant {
        NewParticipant {
            first_name: "Jordan".into(),
            last_name: "Reyes".into(),
            ..Default::default()
        }
    }

    #[test]
    fn volunteer_denied_edit_and_no_state_change() {
        let mut conn = open_memory_database().unwrap();
        let mut gate = AccessGate::new(&mut conn);

        let err = gate
            .create_participant(&actor(Role::Volunteer), new_participant())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PermissionDenied {
                role: Role::Volunteer,
                action: Action::EditParticipant,
            }
        ));
        drop(gate);
        assert_eq!(count_participants(&conn).unwrap(), 0);
    }

    #[test]
    fn coordinator_can_edit_but_not_manage_users() {
        let mut conn = open_memory_database().unwrap();
        let mut gate = AccessGate::new(&mut conn);
        let coordinator = actor(Role::Coordinator);

        gate.create_participant(&coordinator, new_participant()).unwrap();

        let err = gate
            .create_user(
                &coordinator,
                NewUser {
                    username: "intruder".into(),
                    email: "x@example.org".into(),
                    password_hash: "$stub".into(),
                    role: Role::Administrator,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PermissionDenied {
                action: Action::ManageUsers,
                ..
            }
        ));
        assert!(gate.list_users(&actor(Role::Administrator)).unwrap().is_empty());
    }

    #[test]
    fn volunteer_can_view_participants() {
        let mut conn = open_memory_database().unwrap();
        let mut gate = AccessGate::new(&mut conn);
        let created = gate
            .create_participant(&actor(Role::Coordinator), new_participant())
            .unwrap();

        let viewed = gate.get_participant(&actor(Role::Volunteer), &created.id).unwrap();
        assert_eq!(viewed.id, created.id);
    }

    #[test]
    fn volunteer_denied_referral_listing_and_case_management() {
        let mut conn = open_memory_database().unwrap();
        let mut gate = AccessGate::new(&mut conn);
        let volunteer = actor(Role::Volunteer);

        assert!(matches!(
            gate.list_referrals(&volunteer, &ReferralFilter::default()).unwrap_err(),
            ServiceError::PermissionDenied { action: Action::DecideReferral, .. }
        ));
        assert!(matches!(
            gate.open_case(&volunteer, &Uuid::new_v4(), None).unwrap_err(),
            ServiceError::PermissionDenied { action: Action::ManageCase, .. }
        ));
    }

    #[test]
    fn reopen_requires_administrator() {
        let mut conn = open_memory_database().unwrap();
        let id = crate::intake::ingest(&conn, &crate::intake::ReferralSubmission {
            first_name: Some("Jordan".into()),
            last_name: Some("Reyes".into()),
            referrer_name: Some("Sam Okafor".into()),
            referrer_email: Some("sam@school.example.org".into()),
            ..Default::default()
        })
        .unwrap();

        let mut gate = AccessGate::new(&mut conn);
        let coordinator = actor(Role::Coordinator);
        gate.decide_referral(
            &coordinator,
            &id,
            Decision::Reject,
            Some("outside service area".into()),
        )
        .unwrap();

        assert!(matches!(
            gate.reopen_referral(&coordinator, &id).unwrap_err(),
            ServiceError::PermissionDenied { action: Action::ManageUsers, .. }
        ));

        let reverted = gate.reopen_referral(&actor(Role::Administrator), &id).unwrap();
        assert_eq!(reverted.status, crate::models::enums::ReferralStatus::Pending);
    }
}
