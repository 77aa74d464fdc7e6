//! Search queries for the MISP `restSearch` endpoints
//!
//! Every filter is optional. Unset filters are left out of the request body
//! so that the server applies its own defaults.

use serde::Serialize;

const EVENTS_ENDPOINT: &str = "events/restSearch/download";
const ATTRIBUTES_ENDPOINT: &str = "attributes/restSearch/download";

/// Wire wrapper: `{"request": <query>}`
#[derive(Debug, Serialize)]
struct RequestEnvelope<'a, Q: Serialize> {
    request: &'a Q,
}

fn encode<Q: Serialize>(query: &Q) -> Vec<u8> {
    // flat records of strings and integers always encode
    match serde_json::to_vec(&RequestEnvelope { request: query }) {
        Ok(body) => body,
        Err(e) => panic!("failed to encode MISP request: {e}"),
    }
}

/// Query against the event search API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "quickfilter", skip_serializing_if = "Option::is_none")]
    pub quick_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Relative window such as `1d` or `12h`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(rename = "eventid", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(rename = "withAttachments", skip_serializing_if = "Option::is_none")]
    pub with_attachments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// `1` searches every text field of the event
    #[serde(rename = "searchall", skip_serializing_if = "Option::is_none")]
    pub search_all: Option<u8>,
}

impl EventQuery {
    /// Encode the query inside its request envelope
    pub fn prepare(&self) -> Vec<u8> {
        encode(self)
    }
}

/// Query against the attribute search API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(rename = "eventid", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl AttributeQuery {
    /// Encode the query inside its request envelope
    pub fn prepare(&self) -> Vec<u8> {
        encode(self)
    }
}

/// Any supported search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Query {
    Event(EventQuery),
    Attribute(AttributeQuery),
}

impl Query {
    /// Encode the active variant inside the request envelope
    pub fn prepare(&self) -> Vec<u8> {
        match self {
            Query::Event(q) => q.prepare(),
            Query::Attribute(q) => q.prepare(),
        }
    }

    /// Search endpoint path, relative to the server root
    pub fn endpoint(&self) -> &'static str {
        match self {
            Query::Event(_) => EVENTS_ENDPOINT,
            Query::Attribute(_) => ATTRIBUTES_ENDPOINT,
        }
    }

    /// Resource kind searched, as used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Event(_) => "event",
            Query::Attribute(_) => "attribute",
        }
    }
}

impl From<EventQuery> for Query {
    fn from(query: EventQuery) -> Self {
        Query::Event(query)
    }
}

impl From<AttributeQuery> for Query {
    fn from(query: AttributeQuery) -> Self {
        Query::Attribute(query)
    }
}
