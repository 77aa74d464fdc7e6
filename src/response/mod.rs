//! Search responses and the uniform iteration over them
//!
//! The two search endpoints wrap their results differently:
//!
//! - events: `{"response": [{"Event": {...}}, ...]}`
//! - attributes: `{"response": {"Attribute": [{...}, ...]}}`
//!
//! Both are exposed as a [`Response`] that iterates over [`MispObject`]s.

use std::iter::FusedIterator;
use std::vec;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MispError, Result};
use crate::models::{Attribute, Event, Org, RelatedEvent};

/// `{"Event": {...}}` item of an event search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEnvelope {
    #[serde(rename = "Event", deserialize_with = "crate::models::de::null_default")]
    pub event: Event,
}

/// Body of an event search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    #[serde(default, deserialize_with = "crate::models::de::null_default")]
    pub response: Vec<EventEnvelope>,
}

impl EventResponse {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            response: events.into_iter().map(|event| EventEnvelope { event }).collect(),
        }
    }
}

/// `{"Attribute": [...]}` object of an attribute search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeCollection {
    #[serde(
        rename = "Attribute",
        default,
        deserialize_with = "crate::models::de::null_default"
    )]
    pub attributes: Vec<Attribute>,
}

/// Body of an attribute search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeResponse {
    #[serde(default, deserialize_with = "crate::models::de::null_default")]
    pub response: AttributeCollection,
}

impl AttributeResponse {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            response: AttributeCollection { attributes },
        }
    }
}

/// Result of a search
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Response {
    Event(EventResponse),
    Attribute(AttributeResponse),
    /// Nothing to iterate over
    #[default]
    Empty,
}

impl Response {
    /// Number of objects iteration will yield
    pub fn len(&self) -> usize {
        match self {
            Response::Event(r) => r.response.len(),
            Response::Attribute(r) => r.response.attributes.len(),
            Response::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<EventResponse> for Response {
    fn from(response: EventResponse) -> Self {
        Response::Event(response)
    }
}

impl From<AttributeResponse> for Response {
    fn from(response: AttributeResponse) -> Self {
        Response::Attribute(response)
    }
}

/// Object yielded while iterating a [`Response`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MispObject {
    Event(Box<Event>),
    Attribute(Attribute),
}

impl MispObject {
    pub fn into_event(self) -> Option<Event> {
        match self {
            MispObject::Event(event) => Some(*event),
            MispObject::Attribute(_) => None,
        }
    }

    pub fn into_attribute(self) -> Option<Attribute> {
        match self {
            MispObject::Attribute(attribute) => Some(attribute),
            MispObject::Event(_) => None,
        }
    }
}

/// Single pass over the objects of a response, in server order
#[derive(Debug)]
pub struct ResponseIter {
    inner: IterInner,
}

#[derive(Debug)]
enum IterInner {
    Events(vec::IntoIter<EventEnvelope>),
    Attributes(vec::IntoIter<Attribute>),
    Empty,
}

impl Iterator for ResponseIter {
    type Item = MispObject;

    fn next(&mut self) -> Option<MispObject> {
        match &mut self.inner {
            IterInner::Events(it) => it.next().map(|e| MispObject::Event(Box::new(e.event))),
            IterInner::Attributes(it) => it.next().map(MispObject::Attribute),
            IterInner::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Events(it) => it.size_hint(),
            IterInner::Attributes(it) => it.size_hint(),
            IterInner::Empty => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for ResponseIter {}

impl FusedIterator for ResponseIter {}

impl IntoIterator for Response {
    type Item = MispObject;
    type IntoIter = ResponseIter;

    fn into_iter(self) -> ResponseIter {
        let inner = match self {
            Response::Event(r) => IterInner::Events(r.response.into_iter()),
            Response::Attribute(r) => IterInner::Attributes(r.response.attributes.into_iter()),
            Response::Empty => IterInner::Empty,
        };
        ResponseIter { inner }
    }
}

/// Response body that can be salvaged when it does not fully decode
pub(crate) trait Envelope: DeserializeOwned + Default + Into<Response> {
    /// Keep every element, with the fields that decode on their own
    fn salvage(body: &Value) -> Self;
}

/// Decode `value` as `T`, dropping the fields that do not fit
///
/// A dropped field keeps its default. Anything but an object gives `T::default()`.
fn salvage_object<T: DeserializeOwned + Default>(value: &Value) -> T {
    if let Ok(decoded) = T::deserialize(value) {
        return decoded;
    }
    let Some(fields) = value.as_object() else {
        return T::default();
    };

    let kept: Map<String, Value> = fields
        .iter()
        .filter(|&(key, field)| {
            let single = Map::from_iter([(key.clone(), field.clone())]);
            T::deserialize(Value::Object(single)).is_ok()
        })
        .map(|(key, field)| (key.clone(), field.clone()))
        .collect();
    T::deserialize(Value::Object(kept)).unwrap_or_default()
}

/// Salvage each element of the array under `key`, if there is one
fn salvage_nested<T: DeserializeOwned + Default>(value: &Value, key: &str) -> Option<Vec<T>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(salvage_object).collect())
}

fn salvage_attribute_list(value: &Value, key: &str, target: &mut Vec<Attribute>) {
    if let Some(attributes) = salvage_nested(value, key) {
        *target = attributes;
    }
}

/// Field-level salvage of an event, descending into its nested records
fn salvage_event(value: &Value) -> Event {
    let mut event: Event = salvage_object(value);

    salvage_attribute_list(value, "Attribute", &mut event.attributes);
    salvage_attribute_list(value, "ShadowAttribute", &mut event.shadow_attributes);
    if let Some(related) = salvage_nested::<RelatedEvent>(value, "RelatedEvent") {
        event.related_events = related;
    }
    if let Some(galaxies) = salvage_nested::<RelatedEvent>(value, "Galaxy") {
        event.galaxies = galaxies;
    }
    if let Some(org) = value.get("Org") {
        event.org = salvage_object::<Org>(org);
    }
    if let Some(orgc) = value.get("Orgc") {
        event.orgc = salvage_object::<Org>(orgc);
    }
    event
}

impl Envelope for EventResponse {
    fn salvage(body: &Value) -> Self {
        let response = body
            .get("response")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| EventEnvelope {
                        event: item.get("Event").map(salvage_event).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { response }
    }
}

impl Envelope for AttributeResponse {
    fn salvage(body: &Value) -> Self {
        let attributes = body
            .get("response")
            .and_then(|r| salvage_nested(r, "Attribute"))
            .unwrap_or_default();
        Self::new(attributes)
    }
}

/// Decode a 200 body into the envelope `E`, keeping what can be kept on mismatch
pub(crate) fn decode<E: Envelope>(body: &[u8]) -> Result<Response> {
    match serde_json::from_slice::<E>(body) {
        Ok(envelope) => Ok(envelope.into()),
        Err(source) => {
            let partial = serde_json::from_slice::<Value>(body)
                .map(|value| E::salvage(&value))
                .unwrap_or_default();
            Err(MispError::Decode {
                source,
                partial: Box::new(partial.into()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(id: &str, value: &str) -> Attribute {
        Attribute {
            id: id.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_response_yields_nothing() {
        let mut iter = Response::Empty.into_iter();
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn attributes_iterate_in_order() {
        let response = Response::from(AttributeResponse::new(vec![
            attribute("1", "a.example"),
            attribute("2", "b.example"),
        ]));
        assert_eq!(response.len(), 2);

        let values: Vec<String> = response
            .into_iter()
            .filter_map(MispObject::into_attribute)
            .map(|a| a.value)
            .collect();
        assert_eq!(values, ["a.example", "b.example"]);
    }

    #[test]
    fn events_unwrap_their_envelope() {
        let body = br#"{"response":[{"Event":{"id":"1","info":"first"}},{"Event":{"id":"2","info":"second"}}]}"#;
        let response = decode::<EventResponse>(body).unwrap();

        let events: Vec<Event> = response.into_iter().filter_map(MispObject::into_event).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].info, "first");
        assert_eq!(events[1].id, "2");
    }

    #[test]
    fn mismatched_access_returns_none() {
        let object = MispObject::Attribute(attribute("1", "x"));
        assert!(object.clone().into_event().is_none());
        assert!(object.into_attribute().is_some());
    }

    #[test]
    fn missing_collections_decode_empty() {
        assert_eq!(decode::<EventResponse>(b"{}").unwrap(), Response::Event(EventResponse::default()));
        assert!(decode::<AttributeResponse>(br#"{"response":{}}"#).unwrap().is_empty());
    }

    #[test]
    fn shape_mismatch_keeps_every_event() {
        let body = br#"{"response":[{"Event":{"id":"1"}},{"Event":{"id":2,"info":"second"}},{"Event":{"id":"3"}}]}"#;
        let err = decode::<EventResponse>(body).unwrap_err();

        let partial = err.partial_response().unwrap();
        assert!(matches!(partial, Response::Event(_)));
        let events: Vec<Event> = partial
            .clone()
            .into_iter()
            .filter_map(MispObject::into_event)
            .collect();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "", "3"]);
        assert_eq!(events[1].info, "second");
    }

    #[test]
    fn bad_field_in_middle_attribute_keeps_the_rest() {
        let body = br#"{"response":{"Attribute":[
            {"id":"1","value":"a.example"},
            {"id":"2","value":"b.example","to_ids":"yes"},
            {"id":"3","value":"c.example","to_ids":true}
        ]}}"#;
        let err = decode::<AttributeResponse>(body).unwrap_err();
        assert!(err.to_string().contains("expected a boolean"), "{err}");

        let attributes: Vec<Attribute> = err
            .into_response()
            .into_iter()
            .filter_map(MispObject::into_attribute)
            .collect();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes[1].id, "2");
        assert_eq!(attributes[1].value, "b.example");
        assert!(!attributes[1].to_ids);
        assert!(attributes[2].to_ids);
    }

    #[test]
    fn nested_bad_attribute_keeps_the_event() {
        let body = br#"{"response":[{"Event":{"id":"7","Org":{"id":1,"name":"CIRCL"},
            "Attribute":[{"id":"1","value":"x"},{"id":"2","deleted":"no","value":"y"}]}}]}"#;
        let err = decode::<EventResponse>(body).unwrap_err();

        let event = err
            .into_response()
            .into_iter()
            .find_map(MispObject::into_event)
            .unwrap();
        assert_eq!(event.id, "7");
        assert_eq!(event.org.name, "CIRCL");
        assert_eq!(event.org.id, "");
        let values: Vec<&str> = event.attributes.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, ["x", "y"]);
    }

    #[test]
    fn null_fields_and_empty_items_decode() {
        let body = br#"{"response":{"Attribute":[{"id":"1","value":"x","comment":null}]}}"#;
        let attribute = decode::<AttributeResponse>(body)
            .unwrap()
            .into_iter()
            .find_map(MispObject::into_attribute)
            .unwrap();
        assert_eq!(attribute.value, "x");
        assert_eq!(attribute.comment, "");

        let body = br#"{"response":[{"Event":{"id":"1","sharing_group_id":null,"ShadowAttribute":null}},{}]}"#;
        let events: Vec<Event> = decode::<EventResponse>(body)
            .unwrap()
            .into_iter()
            .filter_map(MispObject::into_event)
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "1");
        assert_eq!(events[1], Event::default());

        assert!(decode::<EventResponse>(br#"{"response":null}"#).unwrap().is_empty());
    }

    #[test]
    fn attribute_envelope_in_event_shape_is_a_decode_error() {
        let body = br#"{"response":[{"Attribute":{"id":"1"}}]}"#;
        let err = decode::<AttributeResponse>(body).unwrap_err();

        assert!(matches!(err, MispError::Decode { .. }));
        assert_eq!(err.into_response(), Response::Attribute(AttributeResponse::default()));
    }

    #[test]
    fn non_json_body_gives_empty_partial() {
        let err = decode::<EventResponse>(b"<html>maintenance</html>").unwrap_err();
        assert_eq!(err.partial_response().map(Response::len), Some(0));
    }
}
