use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CaseStatus, NoteKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub case_number: String,
    pub program_type: Option<String>,
    pub status: CaseStatus,
    pub outcome_notes: Option<String>,
    pub outcome_finalized: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Append-only note on a case. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseNote {
    pub id: Uuid,
    pub case_id: Uuid,
    pub author_id: Uuid,
    pub kind: NoteKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
