use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A validation rule that produced one or more violations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Rule identifier, e.g. `NotNull`.
    #[serde(default)]
    pub name: String,
    /// Arbitrary metadata attached to the rule (severity and the like).
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Constraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// The group the violation was declared under, if any.
    pub fn declared_group(&self) -> Option<&str> {
        self.groups.first().map(String::as_str)
    }
}

/// A single reported failure of a validation rule against one property path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub message: String,
    #[serde(default)]
    pub message_template: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub property_path: String,
    #[serde(default)]
    pub invalid_value: Option<Value>,
    #[serde(default)]
    pub constraint: Option<Constraint>,
    #[serde(default)]
    pub code: Option<String>,
}

impl Violation {
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message_template: message.clone(),
            message,
            property_path: property_path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_invalid_value(mut self, value: Value) -> Self {
        self.invalid_value = Some(value);
        self
    }

    /// Payload of the originating constraint, `None` when there is no
    /// constraint or it carries no metadata.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.constraint
            .as_ref()
            .and_then(|c| c.payload.as_ref())
            .filter(|p| !p.is_empty())
    }
}

/// Ordered collection of violations, as handed over by a validator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ConstraintViolationList {
    violations: Vec<Violation>,
}

impl ConstraintViolationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }
}

impl From<Vec<Violation>> for ConstraintViolationList {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl FromIterator<Violation> for ConstraintViolationList {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConstraintViolationList {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_is_none_without_constraint_or_metadata() {
        let bare = Violation::new("name", "must not be blank");
        assert!(bare.payload().is_none());

        let empty = Violation::new("name", "must not be blank")
            .with_constraint(Constraint::new("NotBlank").with_payload(Map::new()));
        assert!(empty.payload().is_none());

        let unset = Violation::new("name", "must not be blank")
            .with_constraint(Constraint::new("NotBlank"));
        assert!(unset.payload().is_none());
    }

    #[test]
    fn deserialize_camel_case_list() {
        let raw = json!([
            {
                "propertyPath": "owner.email",
                "message": "This value is not a valid email address.",
                "code": "bd79c0ab-ddba-46cc-a703-a7a4b08de310",
                "constraint": {
                    "name": "Email",
                    "payload": { "severity": "error" },
                    "groups": ["Default"]
                }
            },
            { "message": "Missing root value." }
        ]);
        let list: ConstraintViolationList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.len(), 2);

        let first = list.iter().next().unwrap();
        assert_eq!(first.property_path, "owner.email");
        assert_eq!(
            first.constraint.as_ref().and_then(Constraint::declared_group),
            Some("Default")
        );
        assert_eq!(first.payload().unwrap()["severity"], "error");

        let second = list.iter().nth(1).unwrap();
        assert_eq!(second.property_path, "");
        assert!(second.code.is_none());
    }
}
