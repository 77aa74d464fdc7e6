//! Core data models for MISP search results
//!
//! MISP encodes most numeric values (ids, timestamps, enum codes) as strings.
//! They are kept as received; only the timestamp accessors interpret them.

pub(crate) mod de;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use timestamp::parse_timestamp;

/// Organisation owning or creating an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Org {
    #[serde(deserialize_with = "de::null_default")]
    pub id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub name: String,
    #[serde(deserialize_with = "de::null_default")]
    pub uuid: String,
}

/// Top-level MISP event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "de::null_default")]
    pub id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub orgc_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub org_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub date: String,
    #[serde(deserialize_with = "de::null_default")]
    pub threat_level_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub info: String,
    #[serde(deserialize_with = "de::null_default")]
    pub published: bool,
    #[serde(deserialize_with = "de::null_default")]
    pub uuid: String,
    #[serde(deserialize_with = "de::null_default")]
    pub attribute_count: String,
    #[serde(deserialize_with = "de::null_default")]
    pub analysis: String,
    #[serde(rename = "timestamp", deserialize_with = "de::null_default")]
    pub raw_timestamp: String,
    #[serde(deserialize_with = "de::null_default")]
    pub distribution: String,
    #[serde(deserialize_with = "de::null_default")]
    pub proposal_email_lock: bool,
    #[serde(deserialize_with = "de::null_default")]
    pub locked: bool,
    #[serde(rename = "publish_timestamp", deserialize_with = "de::null_default")]
    pub raw_publish_timestamp: String,
    #[serde(deserialize_with = "de::null_default")]
    pub sharing_group_id: String,
    #[serde(rename = "Org", deserialize_with = "de::null_default")]
    pub org: Org,
    #[serde(rename = "Orgc", deserialize_with = "de::null_default")]
    pub orgc: Org,
    #[serde(rename = "Attribute", deserialize_with = "de::null_default")]
    pub attributes: Vec<Attribute>,
    #[serde(rename = "ShadowAttribute", deserialize_with = "de::null_default")]
    pub shadow_attributes: Vec<Attribute>,
    #[serde(rename = "RelatedEvent", deserialize_with = "de::null_default")]
    pub related_events: Vec<RelatedEvent>,
    #[serde(rename = "Galaxy", deserialize_with = "de::null_default")]
    pub galaxies: Vec<RelatedEvent>,
}

impl Event {
    /// Last modification time
    ///
    /// # Panics
    ///
    /// Panics if the raw `timestamp` field is not a decimal number of seconds.
    pub fn timestamp(&self) -> DateTime<Utc> {
        timestamp::expect_timestamp(&self.raw_timestamp)
    }

    /// Publication time
    ///
    /// # Panics
    ///
    /// Panics if the raw `publish_timestamp` field is not a decimal number of seconds.
    pub fn published_timestamp(&self) -> DateTime<Utc> {
        timestamp::expect_timestamp(&self.raw_publish_timestamp)
    }
}

/// Event referenced from another event's correlations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedEvent {
    #[serde(deserialize_with = "de::null_default")]
    pub id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub date: String,
    #[serde(deserialize_with = "de::null_default")]
    pub threat_level_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub info: String,
    #[serde(deserialize_with = "de::null_default")]
    pub published: bool,
    #[serde(deserialize_with = "de::null_default")]
    pub uuid: String,
    #[serde(deserialize_with = "de::null_default")]
    pub analysis: String,
    #[serde(rename = "timestamp", deserialize_with = "de::null_default")]
    pub raw_timestamp: String,
    #[serde(deserialize_with = "de::null_default")]
    pub distribution: String,
    #[serde(deserialize_with = "de::null_default")]
    pub org_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub orgc_id: String,
    #[serde(rename = "Org", deserialize_with = "de::null_default")]
    pub org: Org,
    #[serde(rename = "Orgc", deserialize_with = "de::null_default")]
    pub orgc: Org,
}

impl RelatedEvent {
    /// # Panics
    ///
    /// Panics if the raw `timestamp` field is not a decimal number of seconds.
    pub fn timestamp(&self) -> DateTime<Utc> {
        timestamp::expect_timestamp(&self.raw_timestamp)
    }
}

/// Single indicator attached to an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    #[serde(deserialize_with = "de::null_default")]
    pub id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub event_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub uuid: String,
    #[serde(deserialize_with = "de::null_default")]
    pub sharing_group_id: String,
    #[serde(rename = "timestamp", deserialize_with = "de::null_default")]
    pub raw_timestamp: String,
    #[serde(deserialize_with = "de::null_default")]
    pub distribution: String,
    #[serde(deserialize_with = "de::null_default")]
    pub category: String,
    #[serde(rename = "type", deserialize_with = "de::null_default")]
    pub attribute_type: String,
    #[serde(deserialize_with = "de::null_default")]
    pub value: String,
    #[serde(deserialize_with = "de::null_default")]
    pub to_ids: bool,
    #[serde(deserialize_with = "de::null_default")]
    pub deleted: bool,
    #[serde(deserialize_with = "de::null_default")]
    pub comment: String,
}

impl Attribute {
    /// # Panics
    ///
    /// Panics if the raw `timestamp` field is not a decimal number of seconds.
    pub fn timestamp(&self) -> DateTime<Utc> {
        timestamp::expect_timestamp(&self.raw_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_decodes_nested_records() {
        let event: Event = serde_json::from_value(json!({
            "id": "42",
            "orgc_id": "2",
            "org_id": "1",
            "date": "2021-01-07",
            "threat_level_id": "3",
            "info": "phishing wave",
            "published": true,
            "uuid": "5ff6a4c0-0000-4000-8000-000000000042",
            "attribute_count": "1",
            "analysis": "2",
            "timestamp": "1610000000",
            "distribution": "1",
            "proposal_email_lock": false,
            "locked": false,
            "publish_timestamp": "1610000100",
            "sharing_group_id": "0",
            "Org": { "id": "1", "name": "CIRCL", "uuid": "org-1" },
            "Orgc": { "id": "2", "name": "CERT-EU", "uuid": "org-2" },
            "Attribute": [{ "id": "7", "type": "domain", "value": "evil.example" }],
            "ShadowAttribute": [],
            "RelatedEvent": [{ "id": "41", "info": "previous wave", "timestamp": "1609990000" }]
        }))
        .unwrap();

        assert_eq!(event.id, "42");
        assert_eq!(event.attribute_count, "1");
        assert_eq!(event.orgc.name, "CERT-EU");
        assert_eq!(event.attributes[0].attribute_type, "domain");
        assert_eq!(event.related_events[0].id, "41");
        assert!(event.galaxies.is_empty());
        assert_eq!(event.timestamp().to_rfc3339(), "2021-01-07T06:13:20+00:00");
        assert_eq!(event.published_timestamp().timestamp(), 1_610_000_100);
        assert_eq!(event.related_events[0].timestamp().timestamp(), 1_609_990_000);
    }

    #[test]
    fn attribute_keeps_wire_names_when_serialized() {
        let attribute = Attribute {
            id: "1".to_string(),
            attribute_type: "ip-dst".to_string(),
            raw_timestamp: "1610000000".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&attribute).unwrap();
        assert_eq!(value["type"], "ip-dst");
        assert_eq!(value["timestamp"], "1610000000");
    }

    #[test]
    fn null_fields_decode_as_unset() {
        let event: Event = serde_json::from_value(json!({
            "id": "9",
            "sharing_group_id": null,
            "published": null,
            "Orgc": null,
            "ShadowAttribute": null,
            "Attribute": [{ "id": "1", "value": "x", "comment": null, "to_ids": null }]
        }))
        .unwrap();

        assert_eq!(event.id, "9");
        assert_eq!(event.sharing_group_id, "");
        assert!(!event.published);
        assert_eq!(event.orgc, Org::default());
        assert!(event.shadow_attributes.is_empty());
        assert_eq!(event.attributes[0].value, "x");
        assert_eq!(event.attributes[0].comment, "");
        assert!(!event.attributes[0].to_ids);
    }

    #[test]
    #[should_panic(expected = "malformed MISP timestamp")]
    fn attribute_timestamp_panics_on_empty_value() {
        Attribute::default().timestamp();
    }
}
