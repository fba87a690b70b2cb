use serde_json::Value;

use crate::error::NormalizerError;
use crate::name_converter::{NameResolver, ResolutionContext};
use crate::problem::{Payload, ProblemDocument, ViolationEntry, FORMAT};
use crate::violation::{ConstraintViolationList, Violation};

/// Label passed to advanced name converters so they can tell which producer
/// is asking.
pub const PRODUCER: &str = "ConstraintViolationList";

const SUPPORTED_TYPES: &[&str] = &[PRODUCER];

/// Normalizes a [`ConstraintViolationList`] into a [`ProblemDocument`].
///
/// Holds only construction-time configuration, so a single instance can be
/// shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ConstraintViolationListNormalizer {
    serialize_payload_fields: Vec<String>,
    resolver: NameResolver,
    target_type: Option<String>,
}

impl ConstraintViolationListNormalizer {
    pub fn new<I, S>(serialize_payload_fields: I, resolver: NameResolver) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = Vec::new();
        for field in serialize_payload_fields.into_iter().map(Into::<String>::into) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Self {
            serialize_payload_fields: fields,
            resolver,
            target_type: None,
        }
    }

    /// Type whose properties the violations refer to, handed to advanced
    /// name converters.
    #[must_use]
    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    pub fn serialize_payload_fields(&self) -> &[String] {
        &self.serialize_payload_fields
    }

    pub fn supports_normalization(&self, format: &str) -> bool {
        format == FORMAT
    }

    pub fn supported_types(&self, format: &str) -> &'static [&'static str] {
        if self.supports_normalization(format) {
            SUPPORTED_TYPES
        } else {
            &[]
        }
    }

    pub fn normalize(&self, violations: &ConstraintViolationList) -> ProblemDocument {
        let mut messages = Vec::with_capacity(violations.len());
        let mut entries = Vec::with_capacity(violations.len());

        for violation in violations {
            let property_path = self.resolve_name(violation);
            messages.push(format!("{}: {}", property_path, violation.message));
            entries.push(ViolationEntry {
                property_path,
                message: violation.message.clone(),
                code: violation.code.clone(),
                payload: self.filter_payload(violation),
            });
        }

        tracing::debug!(
            violations = entries.len(),
            resolver = ?self.resolver,
            "normalized constraint violation list"
        );

        ProblemDocument::new(messages.join("\n"), entries)
    }

    /// Like [`normalize`](Self::normalize), but refuses formats other than
    /// `jsonproblem`.
    pub fn normalize_for_format(
        &self,
        violations: &ConstraintViolationList,
        format: &str,
    ) -> Result<ProblemDocument, NormalizerError> {
        if !self.supports_normalization(format) {
            return Err(NormalizerError::UnsupportedFormat(format.to_string()));
        }
        Ok(self.normalize(violations))
    }

    pub fn normalize_to_value(
        &self,
        violations: &ConstraintViolationList,
    ) -> Result<Value, NormalizerError> {
        Ok(serde_json::to_value(self.normalize(violations))?)
    }

    fn resolve_name(&self, violation: &Violation) -> String {
        let context = ResolutionContext {
            producer: PRODUCER,
            format: FORMAT,
            group: violation
                .constraint
                .as_ref()
                .and_then(|c| c.declared_group()),
        };
        self.resolver.resolve(
            &violation.property_path,
            self.target_type.as_deref(),
            &context,
        )
    }

    // Walk the allow-list rather than the payload so the output order does not
    // depend on how the payload map is ordered.
    fn filter_payload(&self, violation: &Violation) -> Option<Payload> {
        let payload = violation.payload()?;
        let filtered: Payload = self
            .serialize_payload_fields
            .iter()
            .filter_map(|field| payload.get(field).map(|v| (field.clone(), v.clone())))
            .collect();
        if filtered.is_empty() {
            None
        } else {
            Some(filtered)
        }
    }
}
