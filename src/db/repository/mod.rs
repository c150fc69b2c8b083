pub mod case;
pub mod participant;
pub mod referral;
pub mod user;

use crate::models::PersonProfile;

/// Column list for the person-profile fields shared between `participants`
/// and `referrals`. Order must match `profile_from_row` / `push_profile_params`.
pub(crate) const PROFILE_COLUMNS: &str =
    "phone, email, street_address, city, state, zip_code, \
     emergency_contact_name, emergency_contact_phone, emergency_contact_relationship, \
     school_name, grade_level, race, ethnicity, gender_identity, sex, pronouns, \
     family_structure, allergies, illnesses_disabilities, primary_care_doctor, \
     emergency_instructions, preferred_contact_method, preferred_language";

pub(crate) const PROFILE_COLUMN_COUNT: usize = 23;

/// Read a `PersonProfile` from 23 consecutive columns starting at `start`.
pub(crate) fn profile_from_row(
    row: &rusqlite::Row<'_>,
    start: usize,
) -> rusqlite::Result<PersonProfile> {
    Ok(PersonProfile {
        phone: row.get(start)?,
        email: row.get(start + 1)?,
        street_address: row.get(start + 2)?,
        city: row.get(start + 3)?,
        state: row.get(start + 4)?,
        zip_code: row.get(start + 5)?,
        emergency_contact_name: row.get(start + 6)?,
        emergency_contact_phone: row.get(start + 7)?,
        emergency_contact_relationship: row.get(start + 8)?,
        school_name: row.get(start + 9)?,
        grade_level: row.get(start + 10)?,
        race: row.get(start + 11)?,
        ethnicity: row.get(start + 12)?,
        gender_identity: row.get(start + 13)?,
        sex: row.get(start + 14)?,
        pronouns: row.get(start + 15)?,
        family_structure: row.get(start + 16)?,
        allergies: row.get(start + 17)?,
        illnesses_disabilities: row.get(start + 18)?,
        primary_care_doctor: row.get(start + 19)?,
        emergency_instructions: row.get(start + 20)?,
        preferred_contact_method: row.get(start + 21)?,
        preferred_language: row.get(start + 22)?,
    })
}

/// Append the 23 profile fields to a positional parameter list, in
/// `PROFILE_COLUMNS` order.
pub(crate) fn push_profile_params<'a>(
    params: &mut Vec<&'a dyn rusqlite::ToSql>,
    p: &'a PersonProfile,
) {
    params.extend_from_slice(&[
        &p.phone,
        &p.email,
        &p.street_address,
        &p.city,
        &p.state,
        &p.zip_code,
        &p.emergency_contact_name,
        &p.emergency_contact_phone,
        &p.emergency_contact_relationship,
        &p.school_name,
        &p.grade_level,
        &p.race,
        &p.ethnicity,
        &p.gender_identity,
        &p.sex,
        &p.pronouns,
        &p.family_structure,
        &p.allergies,
        &p.illnesses_disabilities,
        &p.primary_care_doctor,
        &p.emergency_instructions,
        &p.preferred_contact_method,
        &p.preferred_language,
    ]);
}

/// Build a `?1, ?2, ... ?n` placeholder list.
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}
