//! Lenient deserialisers for loosely-typed request payloads.
//!
//! Clients of the registry API historically sent numeric and boolean values
//! as JSON strings (`"age": "30"`, `"married": "true"`). These helpers accept
//! either representation, so the coercion happens at the deserialisation
//! boundary and the rest of the workspace only ever sees strict types.
//!
//! Intended for use with `#[serde(deserialize_with = "...")]`; the `option_*`
//! variants additionally need `#[serde(default)]` so an absent key stays
//! `None`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum FloatToken {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntToken {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolToken {
    Flag(bool),
    Text(String),
}

/// Deserialises an `f64` from either a JSON number or a numeric string.
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match FloatToken::deserialize(deserializer)? {
        FloatToken::Number(value) => Ok(value),
        FloatToken::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("invalid number {text:?}"))
        }),
    }
}

/// Deserialises an `i64` from either a JSON integer or an integer string.
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IntToken::deserialize(deserializer)? {
        IntToken::Number(value) => Ok(value),
        IntToken::Text(text) => text.trim().parse::<i64>().map_err(|_| {
            serde::de::Error::custom(format!("invalid integer {text:?}"))
        }),
    }
}

/// Deserialises a `bool` from either a JSON boolean or `"true"`/`"false"`.
pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolToken::deserialize(deserializer)? {
        BoolToken::Flag(value) => Ok(value),
        BoolToken::Text(text) => match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean {other:?}"
            ))),
        },
    }
}

/// Optional counterpart of [`float`]; `null` maps to `None`.
pub fn option_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FloatToken>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FloatToken::Number(value)) => Ok(Some(value)),
        Some(FloatToken::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number {text:?}"))),
    }
}

/// Optional counterpart of [`int`]; `null` maps to `None`.
pub fn option_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IntToken>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntToken::Number(value)) => Ok(Some(value)),
        Some(IntToken::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid integer {text:?}"))),
    }
}

/// Optional counterpart of [`boolean`]; `null` maps to `None`.
pub fn option_boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<BoolToken>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolToken::Flag(value)) => Ok(Some(value)),
        Some(BoolToken::Text(text)) => match text.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean {other:?}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::float")]
        weight: f64,
        #[serde(deserialize_with = "super::int")]
        age: i64,
        #[serde(default, deserialize_with = "super::option_boolean")]
        married: Option<bool>,
        #[serde(default, deserialize_with = "super::option_float")]
        height: Option<f64>,
        #[serde(default, deserialize_with = "super::option_int")]
        visits: Option<i64>,
    }

    #[test]
    fn test_accepts_native_json_types() {
        let sample: Sample =
            serde_json::from_str(r#"{"weight": 70.5, "age": 30, "married": true}"#).unwrap();
        assert_eq!(sample.weight, 70.5);
        assert_eq!(sample.age, 30);
        assert_eq!(sample.married, Some(true));
        assert_eq!(sample.height, None);
    }

    #[test]
    fn test_coerces_string_representations() {
        let sample: Sample = serde_json::from_str(
            r#"{"weight": "70.5", "age": " 30 ", "married": "false", "height": "1.72", "visits": "3"}"#,
        )
        .unwrap();
        assert_eq!(sample.weight, 70.5);
        assert_eq!(sample.age, 30);
        assert_eq!(sample.married, Some(false));
        assert_eq!(sample.height, Some(1.72));
        assert_eq!(sample.visits, Some(3));
    }

    #[test]
    fn test_null_optional_stays_none() {
        let sample: Sample =
            serde_json::from_str(r#"{"weight": 70.0, "age": 30, "married": null}"#).unwrap();
        assert_eq!(sample.married, None);
    }

    #[test]
    fn test_rejects_non_numeric_strings() {
        let result: Result<Sample, _> =
            serde_json::from_str(r#"{"weight": "heavy", "age": 30}"#);
        assert!(result.is_err());

        let result: Result<Sample, _> =
            serde_json::from_str(r#"{"weight": 70.0, "age": "thirty"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_boolean_token() {
        let result: Result<Sample, _> =
            serde_json::from_str(r#"{"weight": 70.0, "age": 30, "married": "yes"}"#);
        assert!(result.is_err());
    }
}
