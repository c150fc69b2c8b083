use chrono::NaiveDate;
use uuid::Uuid;

use super::enums::{CaseStatus, ParticipantSource, ReferralStatus, UrgencyLevel};

#[derive(Debug, Default)]
pub struct ReferralFilter {
    pub status: Option<ReferralStatus>,
    pub urgency: Option<UrgencyLevel>,
    pub received_from: Option<NaiveDate>,
    pub received_to: Option<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub participant_id: Option<Uuid>,
}

#[derive(Debug, Default)]
pub struct ParticipantFilter {
    pub name: Option<String>,
    pub source: Option<ParticipantSource>,
}
