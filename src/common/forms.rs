//! Lenient field parsing for values that arrive as raw form strings.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

/// Accepts a number, a numeric string, an empty string or null.
/// Blank input becomes `None`; anything else non-numeric is an error.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawNumber::Number(value)) => Ok(Some(value)),
        Some(RawNumber::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawNumber::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{text}' is not a valid number"))),
    }
}

/// Treats an empty string the same as a missing value.
pub fn blank_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field
/// (`None`, via `#[serde(default)]`) in partial updates.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Splits a comma separated option list, dropping blank entries.
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Coordinates {
        #[serde(default, deserialize_with = "blank_as_none")]
        latitude: Option<f64>,
    }

    #[rstest]
    #[case(json!({"latitude": ""}), None)]
    #[case(json!({"latitude": "   "}), None)]
    #[case(json!({"latitude": null}), None)]
    #[case(json!({}), None)]
    #[case(json!({"latitude": "-4.32"}), Some(-4.32))]
    #[case(json!({"latitude": 15.3}), Some(15.3))]
    fn test_blank_as_none_accepts(#[case] input: serde_json::Value, #[case] expected: Option<f64>) {
        let parsed: Coordinates = serde_json::from_value(input).unwrap();
        assert_eq!(parsed.latitude, expected);
    }

    #[test]
    fn test_blank_as_none_rejects_text() {
        let parsed = serde_json::from_value::<Coordinates>(json!({"latitude": "north"}));
        assert!(parsed.is_err());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        village: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_separates_null_from_missing() {
        let missing: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.village, None);
        let cleared: Patch = serde_json::from_value(json!({"village": null})).unwrap();
        assert_eq!(cleared.village, Some(None));
        let set: Patch = serde_json::from_value(json!({"village": "Kimpese"})).unwrap();
        assert_eq!(set.village, Some(Some("Kimpese".to_string())));
    }

    #[test]
    fn test_split_options() {
        assert_eq!(split_options("Oui, Non ,, "), vec!["Oui", "Non"]);
        assert!(split_options("").is_empty());
    }
}
