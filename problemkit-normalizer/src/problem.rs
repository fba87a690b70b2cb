//! RFC 7807 problem document produced from a violation list.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Output format handled by the normalizer.
pub const FORMAT: &str = "jsonproblem";
/// Media type of the serialized document.
pub const MIME_TYPE: &str = "application/problem+json";
pub const PROBLEM_TYPE: &str = "https://tools.ietf.org/html/rfc2616#section-10";
pub const PROBLEM_TITLE: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemDocument {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub detail: String,
    pub violations: Vec<ViolationEntry>,
}

impl ProblemDocument {
    pub fn new(detail: String, violations: Vec<ViolationEntry>) -> Self {
        Self {
            problem_type: PROBLEM_TYPE.to_string(),
            title: PROBLEM_TITLE.to_string(),
            detail,
            violations,
        }
    }
}

/// One violation as exposed to the client.
///
/// `code` is always serialized (as `null` when unknown), `payload` is left
/// out entirely when nothing survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEntry {
    pub property_path: String,
    pub message: String,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

/// Filtered constraint metadata, kept in allow-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Vec<(String, Value)>);

impl Payload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
