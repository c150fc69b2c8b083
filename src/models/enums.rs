use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Volunteer => "volunteer",
    Coordinator => "coordinator",
    Administrator => "administrator",
});

str_enum!(ReferralStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

str_enum!(UrgencyLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

str_enum!(CaseStatus {
    Open => "open",
    InProgress => "in_progress",
    OnHold => "on_hold",
    Closed => "closed",
});

str_enum!(ParticipantSource {
    Manual => "manual",
    Referral => "referral",
});

str_enum!(NoteKind {
    General => "general",
    Meeting => "meeting",
    PhoneCall => "phone_call",
    Email => "email",
});

impl ReferralStatus {
    /// Accepted and rejected referrals do not transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trip() {
        for (variant, s) in [
            (Role::Volunteer, "volunteer"),
            (Role::Coordinator, "coordinator"),
            (Role::Administrator, "administrator"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Role::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn referral_status_round_trip() {
        for (variant, s) in [
            (ReferralStatus::Pending, "pending"),
            (ReferralStatus::Accepted, "accepted"),
            (ReferralStatus::Rejected, "rejected"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ReferralStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn case_status_round_trip() {
        for (variant, s) in [
            (CaseStatus::Open, "open"),
            (CaseStatus::InProgress, "in_progress"),
            (CaseStatus::OnHold, "on_hold"),
            (CaseStatus::Closed, "closed"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(CaseStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn terminal_referral_statuses() {
        assert!(!ReferralStatus::Pending.is_terminal());
        assert!(ReferralStatus::Accepted.is_terminal());
        assert!(ReferralStatus::Rejected.is_terminal());
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("admin").is_err());
        assert!(ReferralStatus::from_str("waitlisted").is_err());
        assert!(UrgencyLevel::from_str("").is_err());
    }
}
