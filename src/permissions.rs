//! Role capability matrix.
//!
//! Pure lookup, no state. Roles are capability supersets of one another
//! (administrator ⊇ coordinator ⊇ volunteer) except user management, which
//! only administrators hold. Denial is the default: an action is allowed
//! only when an arm below explicitly grants it.

use serde::{Deserialize, Serialize};

pub use crate::models::enums::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    ViewParticipant,
    EditParticipant,
    ManageCase,
    DecideReferral,
    ManageUsers,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewParticipant => "view_participant",
            Self::EditParticipant => "edit_participant",
            Self::ManageCase => "manage_case",
            Self::DecideReferral => "decide_referral",
            Self::ManageUsers => "manage_users",
        }
    }
}

/// Check whether `role` holds the capability for `action`.
pub fn can(role: Role, action: Action) -> bool {
    match action {
        Action::ViewParticipant => true,
        Action::EditParticipant | Action::ManageCase | Action::DecideReferral => {
            matches!(role, Role::Coordinator | Role::Administrator)
        }
        Action::ManageUsers => matches!(role, Role::Administrator),
    }
}
