pub mod case;
pub mod enums;
pub mod filters;
pub mod participant;
pub mod referral;
pub mod user;

pub use case::*;
pub use participant::*;
pub use referral::*;
pub use user::*;
