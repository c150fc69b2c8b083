//! Participant store.
//!
//! Canonical record of a person in (or being considered for) the program.
//! Participants are never deleted; updates are field-level merges where an
//! omitted field is preserved and only an explicit `Some(None)` clears.
//! The birth-date-not-in-future invariant is enforced on every write.
//!
//! Staff-facing entry points are `pub(crate)` — they are reachable only
//! through the access gate.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::participant as repo;
use crate::error::ServiceError;
use crate::models::enums::ParticipantSource;
use crate::models::filters::ParticipantFilter;
use crate::models::{ImportantPerson, Participant, PersonProfile};

/// Input for creating a participant directly (staff-entered, `source=manual`,
/// unless the referral pipeline materializes one with `source=referral`).
#[derive(Debug, Clone, Default)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub profile: PersonProfile,
    pub notes: Option<String>,
}

/// Field-level update. `None` keeps the stored value; for clearable fields a
/// `Some(None)` explicitly clears it. Emergency-contact data in particular is
/// never dropped unless the caller clears or replaces it this way.
#[derive(Debug, Clone, Default)]
pub struct ParticipantUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub profile: ProfileUpdate,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub street_address: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub zip_code: Option<Option<String>>,
    pub emergency_contact_name: Option<Option<String>>,
    pub emergency_contact_phone: Option<Option<String>>,
    pub emergency_contact_relationship: Option<Option<String>>,
    pub school_name: Option<Option<String>>,
    pub grade_level: Option<Option<String>>,
    pub race: Option<Option<String>>,
    pub ethnicity: Option<Option<String>>,
    pub gender_identity: Option<Option<String>>,
    pub sex: Option<Option<String>>,
    pub pronouns: Option<Option<String>>,
    pub family_structure: Option<Option<String>>,
    pub allergies: Option<Option<String>>,
    pub illnesses_disabilities: Option<Option<String>>,
    pub primary_care_doctor: Option<Option<String>>,
    pub emergency_instructions: Option<Option<String>>,
    pub preferred_contact_method: Option<Option<String>>,
    pub preferred_language: Option<Option<String>>,
}

macro_rules! merge_fields {
    ($dst:expr, $src:expr, [$($field:ident),+ $(,)?]) => {
        $(
            if let Some(value) = $src.$field {
                $dst.$field = value;
            }
        )+
    };
}

impl ProfileUpdate {
    fn apply(self, profile: &mut PersonProfile) {
        merge_fields!(profile, self, [
            phone, email, street_address, city, state, zip_code,
            emergency_contact_name, emergency_contact_phone,
            emergency_contact_relationship, school_name, grade_level,
            race, ethnicity, gender_identity, sex, pronouns, family_structure,
            allergies, illnesses_disabilities, primary_care_doctor,
            emergency_instructions, preferred_contact_method, preferred_language,
        ]);
    }
}

pub(crate) fn create(
    conn: &Connection,
    new: NewParticipant,
    source: ParticipantSource,
) -> Result<Participant, ServiceError> {
    if new.first_name.trim().is_empty() {
        return Err(ServiceError::validation("first_name", "must not be empty"));
    }
    if new.last_name.trim().is_empty() {
        return Err(ServiceError::validation("last_name", "must not be empty"));
    }
    ensure_birth_date_valid(new.date_of_birth)?;

    let now = Utc::now();
    let participant = Participant {
        id: Uuid::new_v4(),
        first_name: new.first_name,
        last_name: new.last_name,
        date_of_birth: new.date_of_birth,
        profile: new.profile,
        notes: new.notes,
        source,
        created_at: now,
        updated_at: now,
    };
    repo::insert_participant(conn, &participant)?;
    tracing::info!(participant_id = %participant.id, source = source.as_str(), "participant created");
    Ok(participant)
}

pub(crate) fn get(conn: &Connection, id: &Uuid) -> Result<Participant, ServiceError> {
    Ok(repo::get_participant(conn, id)?)
}

pub(crate) fn list(
    conn: &Connection,
    filter: &ParticipantFilter,
) -> Result<Vec<Participant>, ServiceError> {
    Ok(repo::list_participants(conn, filter)?)
}

pub(crate) fn update(
    conn: &Connection,
    id: &Uuid,
    update: ParticipantUpdate,
) -> Result<Participant, ServiceError> {
    let mut participant = repo::get_participant(conn, id)?;

    if let Some(first_name) = update.first_name {
        if first_name.trim().is_empty() {
            return Err(ServiceError::validation("first_name", "must not be empty"));
        }
        participant.first_name = first_name;
    }
    if let Some(last_name) = update.last_name {
        if last_name.trim().is_empty() {
            return Err(ServiceError::validation("last_name", "must not be empty"));
        }
        participant.last_name = last_name;
    }
    if let Some(date_of_birth) = update.date_of_birth {
        ensure_birth_date_valid(date_of_birth)?;
        participant.date_of_birth = date_of_birth;
    }
    update.profile.apply(&mut participant.profile);
    if let Some(notes) = update.notes {
        participant.notes = notes;
    }
    participant.updated_at = Utc::now();

    repo::update_participant(conn, &participant)?;
    Ok(participant)
}

pub(crate) fn add_important_person(
    conn: &Connection,
    participant_id: &Uuid,
    name: String,
    relationship: String,
    phone: Option<String>,
    email: Option<String>,
    notes: Option<String>,
) -> Result<ImportantPerson, ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("name", "must not be empty"));
    }
    if relationship.trim().is_empty() {
        return Err(ServiceError::validation("relationship", "must not be empty"));
    }
    // Existence check so a dangling participant id reads as NotFound, not a
    // foreign-key constraint failure.
    repo::get_participant(conn, participant_id)?;

    let person = ImportantPerson {
        id: Uuid::new_v4(),
        participant_id: *participant_id,
        name,
        relationship,
        phone,
        email,
        notes,
        created_at: Utc::now(),
    };
    repo::insert_important_person(conn, &person)?;
    Ok(person)
}

pub(crate) fn important_persons(
    conn: &Connection,
    participant_id: &Uuid,
) -> Result<Vec<ImportantPerson>, ServiceError> {
    repo::get_participant(conn, participant_id)?;
    Ok(repo::list_important_persons(conn, participant_id)?)
}

pub(crate) fn remove_important_person(
    conn: &Connection,
    participant_id: &Uuid,
    person_id: &Uuid,
) -> Result<(), ServiceError> {
    Ok(repo::delete_important_person(conn, participant_id, person_id)?)
}

fn ensure_birth_date_valid(date_of_birth: Option<NaiveDate>) -> Result<(), ServiceError> {
    if let Some(dob) = date_of_birth {
        if dob > Utc::now().date_naive() {
            return Err(ServiceError::validation(
                "date_of_birth",
                "must not be in the future",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sample() -> NewParticipant {
        NewParticipant {
            first_name: "Jordan".into(),
            last_name: "Reyes".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2009, 4, 12),
            ..Default::default()
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let created = create(&conn, sample(), ParticipantSource::Manual).unwrap();
        let fetched = get(&conn, &created.id).unwrap();
        assert_eq!(fetched.full_name(), "Jordan Reyes");
        assert_eq!(fetched.source, ParticipantSource::Manual);
        assert_eq!(fetched.date_of_birth, NaiveDate::from_ymd_opt(2009, 4, 12));
    }

    #[test]
    fn future_birth_date_rejected_and_not_persisted() {
        let conn = open_memory_database().unwrap();
        let mut new = sample();
        new.date_of_birth = Some(Utc::now().date_naive() + chrono::Duration::days(30));

        let err = create(&conn, new, ParticipantSource::Manual).unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "date_of_birth", .. }));
        assert_eq!(repo::count_participants(&conn).unwrap(), 0);
    }

    #[test]
    fn update_merges_and_preserves_omitted_fields() {
        let conn = open_memory_database().unwrap();
        let mut new = sample();
        new.profile.emergency_contact_name = Some("Maria Reyes".into());
        new.profile.emergency_contact_phone = Some("555-0100".into());
        let created = create(&conn, new, ParticipantSource::Manual).unwrap();

        let updated = update(
            &conn,
            &created.id,
            ParticipantUpdate {
                profile: ProfileUpdate {
                    phone: Some(Some("555-0199".into())),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.profile.phone.as_deref(), Some("555-0199"));
        // Emergency contact untouched by an unrelated update
        assert_eq!(updated.profile.emergency_contact_name.as_deref(), Some("Maria Reyes"));
        assert_eq!(updated.profile.emergency_contact_phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn explicit_clear_removes_field() {
        let conn = open_memory_database().unwrap();
        let mut new = sample();
        new.profile.emergency_contact_name = Some("Maria Reyes".into());
        let created = create(&conn, new, ParticipantSource::Manual).unwrap();

        let updated = update(
            &conn,
            &created.id,
            ParticipantUpdate {
                profile: ProfileUpdate {
                    emergency_contact_name: Some(None),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();
        assert!(updated.profile.emergency_contact_name.is_none());
    }

    #[test]
    fn update_rejects_future_birth_date_without_persisting() {
        let conn = open_memory_database().unwrap();
        let created = create(&conn, sample(), ParticipantSource::Manual).unwrap();

        let err = update(
            &conn,
            &created.id,
            ParticipantUpdate {
                date_of_birth: Some(Some(Utc::now().date_naive() + chrono::Duration::days(1))),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "date_of_birth", .. }));

        let stored = get(&conn, &created.id).unwrap();
        assert_eq!(stored.date_of_birth, NaiveDate::from_ymd_opt(2009, 4, 12));
    }

    #[test]
    fn important_person_lifecycle() {
        let conn = open_memory_database().unwrap();
        let created = create(&conn, sample(), ParticipantSource::Manual).unwrap();

        let person = add_important_person(
            &conn,
            &created.id,
            "Maria Reyes".into(),
            "parent".into(),
            Some("555-0100".into()),
            None,
            None,
        )
        .unwrap();

        assert_eq!(important_persons(&conn, &created.id).unwrap().len(), 1);

        remove_important_person(&conn, &created.id, &person.id).unwrap();
        assert!(important_persons(&conn, &created.id).unwrap().is_empty());

        let err = remove_important_person(&conn, &created.id, &person.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn get_unknown_participant_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = get(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
