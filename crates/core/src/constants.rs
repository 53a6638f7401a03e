//! Shared constants for the record schema and runtime defaults.

/// Exclusive lower bound for a patient's age.
pub const AGE_MIN: i64 = 0;

/// Exclusive upper bound for a patient's age.
pub const AGE_MAX: i64 = 120;

/// Age above which an emergency contact becomes mandatory.
pub const EMERGENCY_CONTACT_AGE: i64 = 60;

/// Key that must be present in `contact_details` for older patients.
pub const EMERGENCY_CONTACT_KEY: &str = "emergency";

/// Maximum length of a patient's name, in characters.
pub const NAME_MAX_LEN: usize = 50;

/// Maximum number of recorded allergies.
pub const ALLERGIES_MAX: usize = 5;

/// BMI below this value reads as "under weight".
pub const BMI_UNDERWEIGHT_BELOW: f64 = 18.5;

/// BMI at or above this value reads as "Obese".
pub const BMI_OBESE_FROM: f64 = 30.0;

/// Default record document path when `PMR_DATA_FILE` is unset.
pub const DEFAULT_DATA_FILE: &str = "patients.json";
