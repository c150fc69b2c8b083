use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReferralStatus, UrgencyLevel};
use super::participant::PersonProfile;

/// Inbound referral from the external form webhook.
///
/// Carries the subject's identifying fields as a provisional sub-record until
/// acceptance links (or creates) a Participant. `received_at` is immutable;
/// decision fields are set exactly once when the referral leaves `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub participant_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(flatten)]
    pub profile: PersonProfile,
    pub referrer_name: String,
    pub referrer_email: String,
    pub referrer_phone: Option<String>,
    pub referrer_organization: Option<String>,
    pub referrer_relationship: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub incident_description: Option<String>,
    pub desired_outcome: Option<String>,
    pub previous_interventions: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub status: ReferralStatus,
    pub rejection_reason: Option<String>,
    pub received_at: DateTime<Utc>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Referral {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
