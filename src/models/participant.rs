use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ParticipantSource;

/// Contact, emergency, school, demographic, health and preference fields
/// shared verbatim between a Participant and the provisional sub-record a
/// Referral carries before acceptance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(flatten)]
    pub profile: PersonProfile,
    pub notes: Option<String>,
    pub source: ParticipantSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Named relationship to a participant (parent, guardian, case worker, ...).
/// Owned by exactly one participant; removed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportantPerson {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
