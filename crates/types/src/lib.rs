//! Validated primitive types shared across the PMR workspace.
//!
//! These types guarantee their invariants at construction time, so any code
//! holding one never needs to re-check it. Serde implementations validate on
//! the way in, which keeps invalid values out of deserialised documents too.

pub mod lenient;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The input text exceeded the maximum permitted length
    #[error("text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction. Use [`NonEmptyText::bounded`] when a field also carries a
/// maximum length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty or contains
    /// only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText` that is additionally bounded in length.
    ///
    /// The length bound is applied to the trimmed input, counted in
    /// characters rather than bytes.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for empty/whitespace-only input, or
    /// `TextError::TooLong` if the trimmed input exceeds `max` characters.
    pub fn bounded(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a gender token.
#[derive(Debug, thiserror::Error)]
pub enum GenderError {
    /// The token was not one of the recognised gender values
    #[error("unknown gender {0:?} (expected male, female or other)")]
    Unknown(String),
}

/// The gender of a patient.
///
/// Serialises as the lowercase tokens `male`, `female` and `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Returns the wire token for this gender.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = GenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            unknown => Err(GenderError::Unknown(unknown.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_accepts_and_trims() {
        let text = NonEmptyText::new("  Leeds  ").expect("should accept");
        assert_eq!(text.as_str(), "Leeds");
    }

    #[test]
    fn test_non_empty_text_rejects_empty_and_whitespace() {
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn test_bounded_text_enforces_character_limit() {
        assert!(NonEmptyText::bounded("a".repeat(50), 50).is_ok());
        let err = NonEmptyText::bounded("a".repeat(51), 50).expect_err("should reject");
        assert!(matches!(err, TextError::TooLong { max: 50 }));
    }

    #[test]
    fn test_bounded_text_counts_characters_not_bytes() {
        // four characters, more than four bytes
        assert!(NonEmptyText::bounded("Zoë!", 4).is_ok());
    }

    #[test]
    fn test_non_empty_text_deserialisation_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_gender_parses_known_tokens() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("other".parse::<Gender>().unwrap(), Gender::Other);
    }

    #[test]
    fn test_gender_rejects_unknown_token() {
        let err = "m".parse::<Gender>().expect_err("should reject");
        assert!(matches!(err, GenderError::Unknown(token) if token == "m"));
    }

    #[test]
    fn test_gender_round_trips_through_serde() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        let parsed: Gender = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(parsed, Gender::Other);
    }
}
