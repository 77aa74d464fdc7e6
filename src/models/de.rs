// src/models/de.rs

use serde::{Deserialize, Deserializer};

/// Decode a field, reading an explicit `null` as the type's default
///
/// `#[serde(default)]` only covers absent keys; MISP also sends `null` for
/// unset values such as `comment` or `sharing_group_id`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Record {
        #[serde(deserialize_with = "null_default")]
        name: String,
        #[serde(deserialize_with = "null_default")]
        flag: bool,
        #[serde(deserialize_with = "null_default")]
        items: Vec<String>,
    }

    #[test]
    fn null_reads_as_default() {
        let record: Record =
            serde_json::from_value(json!({ "name": null, "flag": null, "items": null })).unwrap();
        assert_eq!(record.name, "");
        assert!(!record.flag);
        assert!(record.items.is_empty());
    }

    #[test]
    fn present_values_are_kept_and_bad_types_still_fail() {
        let record: Record =
            serde_json::from_value(json!({ "name": "x", "items": ["a"] })).unwrap();
        assert_eq!(record.name, "x");
        assert_eq!(record.items, ["a"]);

        assert!(serde_json::from_value::<Record>(json!({ "flag": "yes" })).is_err());
    }
}
