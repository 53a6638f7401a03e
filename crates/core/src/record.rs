//! The patient record schema.
//!
//! This module owns the shape of a patient record, the validation rules each
//! field must satisfy, and the two derived fields (`bmi` and `verdict`) that
//! are recomputed from `height`/`weight` whenever a record is built. Derived
//! fields are never stored and never copied from a prior state, so they
//! cannot drift from their source fields.
//!
//! Validation is all-or-nothing: a candidate either becomes a [`Patient`]
//! with every constraint satisfied, or the caller gets a [`ValidationError`]
//! listing every violated field. There is no partially-valid record.

use crate::constants::{
    AGE_MAX, AGE_MIN, ALLERGIES_MAX, BMI_OBESE_FROM, BMI_UNDERWEIGHT_BELOW, EMERGENCY_CONTACT_AGE,
    EMERGENCY_CONTACT_KEY, NAME_MAX_LEN,
};
use pmr_types::{lenient, Gender, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the offending field
    pub field: &'static str,
    /// What the field failed to satisfy
    pub reason: String,
}

impl Violation {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// A rejected candidate record, carrying every violated constraint.
#[derive(Debug, thiserror::Error)]
#[error("validation failed: {}", describe(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// True if any violation names the given field.
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// Computes body-mass index from height (metres) and weight (kilograms),
/// rounded to 2 decimal places.
pub fn bmi(height: f64, weight: f64) -> f64 {
    ((weight / (height * height)) * 100.0).round() / 100.0
}

/// Categorical classification of a BMI value.
///
/// Serialises as the historical wire tokens `"under weight"`, `"Normal"`
/// and `"Obese"`, capitalisation included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "under weight")]
    UnderWeight,
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Obese")]
    Obese,
}

impl Verdict {
    /// Classifies a BMI value.
    ///
    /// Everything from 18.5 up to 30 reads as `Normal`; there is no
    /// separate overweight band.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < BMI_UNDERWEIGHT_BELOW {
            Verdict::UnderWeight
        } else if bmi < BMI_OBESE_FROM {
            Verdict::Normal
        } else {
            Verdict::Obese
        }
    }

    /// Returns the wire token for this verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::UnderWeight => "under weight",
            Verdict::Normal => "Normal",
            Verdict::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate patient record as received from a caller.
///
/// Fields are loosely typed: numeric fields accept numeric strings and
/// `gender` is a free string, so every constraint failure can be reported as
/// a field-level violation instead of a transport-level parse error.
/// [`PatientInput::validate`] turns a candidate into a [`Patient`].
#[derive(Debug, Clone, Deserialize)]
pub struct PatientInput {
    pub id: String,
    pub name: String,
    pub city: String,
    #[serde(deserialize_with = "lenient::int")]
    pub age: i64,
    pub gender: String,
    #[serde(deserialize_with = "lenient::float")]
    pub height: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub weight: f64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_boolean")]
    pub married: Option<bool>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub contact_details: Option<BTreeMap<String, String>>,
}

impl PatientInput {
    /// Validates the candidate and builds a [`Patient`].
    ///
    /// Every per-field constraint is checked, plus the cross-field rule that
    /// patients older than 60 must carry an `"emergency"` contact. All
    /// violations are collected before returning, so a caller sees the full
    /// picture in one round trip. On success, `bmi` and `verdict` are
    /// computed from the validated `height`/`weight`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` listing one [`Violation`] per unmet
    /// constraint.
    pub fn validate(self) -> Result<Patient, ValidationError> {
        let mut violations = Vec::new();

        let id = check_text(&mut violations, "id", NonEmptyText::new(&self.id));
        let name = check_text(
            &mut violations,
            "name",
            NonEmptyText::bounded(&self.name, NAME_MAX_LEN),
        );
        let city = check_text(&mut violations, "city", NonEmptyText::new(&self.city));

        let age = if self.age > AGE_MIN && self.age < AGE_MAX {
            Some(self.age as u32)
        } else {
            violations.push(Violation::new(
                "age",
                format!("must lie strictly between {AGE_MIN} and {AGE_MAX}"),
            ));
            None
        };

        let gender = match self.gender.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(e) => {
                violations.push(Violation::new("gender", e.to_string()));
                None
            }
        };

        let height = check_positive(&mut violations, "height", self.height);
        let weight = check_positive(&mut violations, "weight", self.weight);

        if let Some(email) = self.email.as_deref() {
            if !email_shape_ok(email) {
                violations.push(Violation::new("email", "must be a valid email address"));
            }
        }

        if let Some(allergies) = self.allergies.as_ref() {
            if allergies.len() > ALLERGIES_MAX {
                violations.push(Violation::new(
                    "allergies",
                    format!("at most {ALLERGIES_MAX} allergies can be recorded"),
                ));
            }
        }

        // Cross-field rule: older patients must be reachable in an emergency.
        if self.age > EMERGENCY_CONTACT_AGE && self.age < AGE_MAX {
            let has_emergency = self
                .contact_details
                .as_ref()
                .is_some_and(|details| details.contains_key(EMERGENCY_CONTACT_KEY));
            if !has_emergency {
                violations.push(Violation::new(
                    "contact_details",
                    format!(
                        "patients older than {EMERGENCY_CONTACT_AGE} must provide an \
                         {EMERGENCY_CONTACT_KEY:?} contact number"
                    ),
                ));
            }
        }

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        // Every None above pushed a violation, so these arms cannot miss.
        let (id, name, city) = match (id, name, city) {
            (Some(id), Some(name), Some(city)) => (id, name, city),
            _ => unreachable!("missing field without recorded violation"),
        };
        let (age, gender) = match (age, gender) {
            (Some(age), Some(gender)) => (age, gender),
            _ => unreachable!("missing field without recorded violation"),
        };

        let computed_bmi = bmi(height, weight);
        Ok(Patient {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
            email: self.email,
            married: self.married,
            allergies: self.allergies,
            contact_details: self.contact_details,
            bmi: computed_bmi,
            verdict: Verdict::from_bmi(computed_bmi),
        })
    }
}

fn check_text(
    violations: &mut Vec<Violation>,
    field: &'static str,
    result: Result<NonEmptyText, pmr_types::TextError>,
) -> Option<NonEmptyText> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            violations.push(Violation::new(field, e.to_string()));
            None
        }
    }
}

fn check_positive(violations: &mut Vec<Violation>, field: &'static str, value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        violations.push(Violation::new(field, "must be a positive number"));
    }
    value
}

fn email_shape_ok(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// A fully validated patient record.
///
/// Can only be obtained through [`PatientInput::validate`],
/// [`Patient::apply`] or [`Patient::from_stored`], all of which recompute
/// the derived fields, so `bmi`/`verdict` are always consistent with the
/// record's current `height`/`weight`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    id: NonEmptyText,
    name: NonEmptyText,
    city: NonEmptyText,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    married: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact_details: Option<BTreeMap<String, String>>,
    bmi: f64,
    verdict: Verdict,
}

impl Patient {
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn city(&self) -> &str {
        self.city.as_str()
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn married(&self) -> Option<bool> {
        self.married
    }

    pub fn allergies(&self) -> Option<&[String]> {
        self.allergies.as_deref()
    }

    pub fn contact_details(&self) -> Option<&BTreeMap<String, String>> {
        self.contact_details.as_ref()
    }

    /// Body-mass index, derived from `height`/`weight`.
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    /// Categorical classification of [`Patient::bmi`].
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Applies a partial-update fragment and re-validates the result.
    ///
    /// Fields present in the fragment overwrite the existing values; absent
    /// fields are left untouched. The record's `id` is never affected —
    /// fragments carry no id. The merged candidate goes through full
    /// validation again, so an update can neither smuggle in an out-of-range
    /// value nor leave `bmi`/`verdict` stale.
    ///
    /// # Errors
    ///
    /// Returns the same `ValidationError` as [`PatientInput::validate`] when
    /// the merged record violates the schema. `self` is untouched either way.
    pub fn apply(&self, fragment: &PatientUpdate) -> Result<Patient, ValidationError> {
        let candidate = PatientInput {
            id: self.id.as_str().to_owned(),
            name: fragment
                .name
                .clone()
                .unwrap_or_else(|| self.name.as_str().to_owned()),
            city: fragment
                .city
                .clone()
                .unwrap_or_else(|| self.city.as_str().to_owned()),
            age: fragment.age.unwrap_or(i64::from(self.age)),
            gender: fragment
                .gender
                .clone()
                .unwrap_or_else(|| self.gender.to_string()),
            height: fragment.height.unwrap_or(self.height),
            weight: fragment.weight.unwrap_or(self.weight),
            email: fragment.email.clone().or_else(|| self.email.clone()),
            married: fragment.married.or(self.married),
            allergies: fragment
                .allergies
                .clone()
                .or_else(|| self.allergies.clone()),
            contact_details: fragment
                .contact_details
                .clone()
                .or_else(|| self.contact_details.clone()),
        };

        candidate.validate()
    }

    /// Rebuilds a record from its persisted source fields.
    ///
    /// Derived fields are recomputed here, never read from storage.
    pub fn from_stored(id: NonEmptyText, stored: StoredPatient) -> Patient {
        let computed_bmi = bmi(stored.height, stored.weight);
        Patient {
            id,
            name: stored.name,
            city: stored.city,
            age: stored.age,
            gender: stored.gender,
            height: stored.height,
            weight: stored.weight,
            email: stored.email,
            married: stored.married,
            allergies: stored.allergies,
            contact_details: stored.contact_details,
            bmi: computed_bmi,
            verdict: Verdict::from_bmi(computed_bmi),
        }
    }

    /// Projects the record down to its persisted source fields.
    ///
    /// The id is the collection key and the derived fields are recomputed on
    /// read, so neither appears in the projection.
    pub fn to_stored(&self) -> StoredPatient {
        StoredPatient {
            name: self.name.clone(),
            city: self.city.clone(),
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
            email: self.email.clone(),
            married: self.married,
            allergies: self.allergies.clone(),
            contact_details: self.contact_details.clone(),
        }
    }
}

/// A partial set of field changes for an existing record.
///
/// Every field is optional; only present fields overwrite. There is no `id`
/// field — an `id` key in an update payload is silently ignored, which keeps
/// the record key immutable. Optional record fields can be set by a fragment
/// but not cleared back to absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_int")]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_float")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_float")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_boolean")]
    pub married: Option<bool>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub contact_details: Option<BTreeMap<String, String>>,
}

/// The persisted form of a record: source fields only.
///
/// `id` lives as the collection key; `bmi` and `verdict` are recomputed via
/// [`Patient::from_stored`] every time the record is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPatient {
    pub name: NonEmptyText,
    pub city: NonEmptyText,
    pub age: u32,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub married: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PatientInput {
        PatientInput {
            id: "P001".into(),
            name: "Josh".into(),
            city: "Leeds".into(),
            age: 30,
            gender: "male".into(),
            height: 1.8,
            weight: 70.0,
            email: None,
            married: None,
            allergies: None,
            contact_details: None,
        }
    }

    #[test]
    fn test_valid_input_computes_bmi_and_verdict() {
        let patient = input().validate().expect("should validate");
        assert_eq!(patient.id(), "P001");
        assert_eq!(patient.bmi(), 21.6);
        assert_eq!(patient.verdict(), Verdict::Normal);
    }

    #[test]
    fn test_bmi_rounds_to_two_decimals() {
        assert_eq!(bmi(1.72, 75.2), 25.42);
        assert_eq!(bmi(2.0, 80.0), 20.0);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::UnderWeight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::Normal);
        // 25..30 deliberately still reads as Normal.
        assert_eq!(Verdict::from_bmi(27.0), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(29.99), Verdict::Normal);
        assert_eq!(Verdict::from_bmi(30.0), Verdict::Obese);
        assert_eq!(Verdict::from_bmi(31.0), Verdict::Obese);
    }

    #[test]
    fn test_verdict_wire_tokens() {
        assert_eq!(
            serde_json::to_string(&Verdict::UnderWeight).unwrap(),
            "\"under weight\""
        );
        assert_eq!(serde_json::to_string(&Verdict::Normal).unwrap(), "\"Normal\"");
        assert_eq!(serde_json::to_string(&Verdict::Obese).unwrap(), "\"Obese\"");
    }

    #[test]
    fn test_age_bounds_are_exclusive() {
        for bad in [0, 120, -3, 150] {
            let mut candidate = input();
            candidate.age = bad;
            let err = candidate.validate().expect_err("should reject");
            assert!(err.names_field("age"), "age {bad} should be rejected");
        }
        for good in [1, 119] {
            let mut candidate = input();
            candidate.age = good;
            // Keep the over-60 emergency-contact rule out of this test's way.
            candidate.contact_details = Some(BTreeMap::from([(
                "emergency".to_owned(),
                "123-456-7890".to_owned(),
            )]));
            assert!(candidate.validate().is_ok(), "age {good} should pass");
        }
    }

    #[test]
    fn test_height_and_weight_must_be_positive() {
        let mut candidate = input();
        candidate.height = 0.0;
        candidate.weight = -70.0;
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("height"));
        assert!(err.names_field("weight"));
    }

    #[test]
    fn test_non_finite_measurements_are_rejected() {
        let mut candidate = input();
        candidate.height = f64::NAN;
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("height"));
    }

    #[test]
    fn test_unknown_gender_is_a_field_violation() {
        let mut candidate = input();
        candidate.gender = "m".into();
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("gender"));
    }

    #[test]
    fn test_empty_id_name_city_are_rejected() {
        let mut candidate = input();
        candidate.id = "".into();
        candidate.name = "  ".into();
        candidate.city = "".into();
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("id"));
        assert!(err.names_field("name"));
        assert!(err.names_field("city"));
    }

    #[test]
    fn test_name_longer_than_fifty_characters_is_rejected() {
        let mut candidate = input();
        candidate.name = "x".repeat(51);
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("name"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut candidate = input();
        candidate.age = 150;
        candidate.gender = "unknown".into();
        candidate.height = 0.0;
        let err = candidate.validate().expect_err("should reject");
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn test_email_shape_is_checked_when_present() {
        let mut candidate = input();
        candidate.email = Some("josh@example.com".into());
        assert!(candidate.validate().is_ok());

        for bad in ["josh", "@example.com", "josh@", "a@b@c.com", "josh@nodot"] {
            let mut candidate = input();
            candidate.email = Some(bad.into());
            let err = candidate.validate().expect_err("should reject");
            assert!(err.names_field("email"), "email {bad:?} should be rejected");
        }
    }

    #[test]
    fn test_allergy_list_is_capped() {
        let mut candidate = input();
        candidate.allergies = Some(vec!["pollen".into(); 6]);
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("allergies"));

        let mut candidate = input();
        candidate.allergies = Some(vec!["pollen".into(), "dust".into()]);
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn test_older_patients_need_emergency_contact() {
        let mut candidate = input();
        candidate.age = 61;
        let err = candidate.validate().expect_err("should reject");
        assert!(err.names_field("contact_details"));

        let mut candidate = input();
        candidate.age = 61;
        candidate.contact_details = Some(BTreeMap::from([(
            "emergency".to_owned(),
            "123-456-7890".to_owned(),
        )]));
        assert!(candidate.validate().is_ok());

        // At 60 exactly the rule does not apply.
        let mut candidate = input();
        candidate.age = 60;
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn test_numeric_strings_are_coerced_in_payloads() {
        let candidate: PatientInput = serde_json::from_str(
            r#"{"id": "P001", "name": "Josh", "city": "Leeds", "age": "30",
                "gender": "male", "height": "1.8", "weight": "70"}"#,
        )
        .unwrap();
        let patient = candidate.validate().expect("should validate");
        assert_eq!(patient.age(), 30);
        assert_eq!(patient.bmi(), 21.6);
    }

    #[test]
    fn test_empty_fragment_is_identity() {
        let patient = input().validate().unwrap();
        let merged = patient.apply(&PatientUpdate::default()).unwrap();
        assert_eq!(merged, patient);
    }

    #[test]
    fn test_fragment_overwrites_only_present_fields() {
        let patient = input().validate().unwrap();
        let fragment = PatientUpdate {
            weight: Some(95.0),
            city: Some("York".into()),
            ..PatientUpdate::default()
        };
        let merged = patient.apply(&fragment).unwrap();
        assert_eq!(merged.weight(), 95.0);
        assert_eq!(merged.city(), "York");
        assert_eq!(merged.name(), "Josh");
        assert_eq!(merged.age(), 30);
    }

    #[test]
    fn test_fragment_recomputes_derived_fields() {
        let patient = input().validate().unwrap();
        let fragment = PatientUpdate {
            weight: Some(100.0),
            ..PatientUpdate::default()
        };
        let merged = patient.apply(&fragment).unwrap();
        assert_eq!(merged.bmi(), bmi(1.8, 100.0));
        assert_eq!(merged.verdict(), Verdict::Obese);
    }

    #[test]
    fn test_fragment_cannot_change_id() {
        // An id key in the payload is ignored by deserialisation...
        let fragment: PatientUpdate =
            serde_json::from_str(r#"{"id": "P999", "weight": 75.0}"#).unwrap();
        // ...so the merged record keeps its key.
        let patient = input().validate().unwrap();
        let merged = patient.apply(&fragment).unwrap();
        assert_eq!(merged.id(), "P001");
        assert_eq!(merged.weight(), 75.0);
    }

    #[test]
    fn test_fragment_with_invalid_value_is_rejected_whole() {
        let patient = input().validate().unwrap();
        let fragment = PatientUpdate {
            age: Some(150),
            ..PatientUpdate::default()
        };
        let err = patient.apply(&fragment).expect_err("should reject");
        assert!(err.names_field("age"));
    }

    #[test]
    fn test_stored_projection_drops_derived_fields() {
        let patient = input().validate().unwrap();
        let stored = serde_json::to_value(patient.to_stored()).unwrap();
        let object = stored.as_object().unwrap();
        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("bmi"));
        assert!(!object.contains_key("verdict"));
    }

    #[test]
    fn test_from_stored_recomputes_derived_fields() {
        let patient = input().validate().unwrap();
        let rebuilt = Patient::from_stored(
            NonEmptyText::new("P001").unwrap(),
            patient.to_stored(),
        );
        assert_eq!(rebuilt, patient);
        assert_eq!(rebuilt.bmi(), 21.6);
    }

    #[test]
    fn test_patient_serialises_with_derived_fields() {
        let patient = input().validate().unwrap();
        let value = serde_json::to_value(&patient).unwrap();
        assert_eq!(value["bmi"], 21.6);
        assert_eq!(value["verdict"], "Normal");
        assert_eq!(value["gender"], "male");
        // Absent optionals stay off the wire.
        assert!(value.get("email").is_none());
    }
}
