//! Translation of internal property paths into the field names shown to clients.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Converts a property name without any context.
pub trait NameConverter: Send + Sync {
    fn normalize(&self, property_name: &str) -> String;
}

/// Converts a property name knowing which type and producer it belongs to.
pub trait AdvancedNameConverter: Send + Sync {
    fn normalize(
        &self,
        property_name: &str,
        target_type: Option<&str>,
        context: &ResolutionContext<'_>,
    ) -> String;
}

/// Context handed to an [`AdvancedNameConverter`] for each violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionContext<'a> {
    /// Stable label of the calling normalizer.
    pub producer: &'a str,
    /// Output format being produced.
    pub format: &'a str,
    /// Validation group the violation was declared under.
    pub group: Option<&'a str>,
}

/// The name resolution capability a normalizer was built with.
///
/// Picked once when the normalizer is built.
#[derive(Clone, Default)]
pub enum NameResolver {
    #[default]
    Identity,
    Basic(Arc<dyn NameConverter>),
    Advanced(Arc<dyn AdvancedNameConverter>),
}

impl NameResolver {
    pub fn basic<C: NameConverter + 'static>(converter: C) -> Self {
        Self::Basic(Arc::new(converter))
    }

    pub fn advanced<C: AdvancedNameConverter + 'static>(converter: C) -> Self {
        Self::Advanced(Arc::new(converter))
    }

    pub fn resolve(
        &self,
        property_path: &str,
        target_type: Option<&str>,
        context: &ResolutionContext<'_>,
    ) -> String {
        match self {
            Self::Identity => property_path.to_string(),
            Self::Basic(converter) => converter.normalize(property_path),
            Self::Advanced(converter) => converter.normalize(property_path, target_type, context),
        }
    }
}

impl fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Identity => "Identity",
            Self::Basic(_) => "Basic",
            Self::Advanced(_) => "Advanced",
        };
        f.debug_tuple("NameResolver").field(&kind).finish()
    }
}

/// `firstName` -> `first_name`, applied to every segment of a dotted path.
#[derive(Debug, Clone, Default)]
pub struct CamelCaseToSnakeCase {
    attributes: Option<HashSet<String>>,
}

impl CamelCaseToSnakeCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only convert the listed names; anything else is echoed.
    pub fn only<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: Some(attributes.into_iter().map(Into::into).collect()),
        }
    }
}

impl NameConverter for CamelCaseToSnakeCase {
    fn normalize(&self, property_name: &str) -> String {
        if let Some(attributes) = &self.attributes {
            if !attributes.contains(property_name) {
                return property_name.to_string();
            }
        }

        let mut out = String::with_capacity(property_name.len() + 4);
        let mut segment_start = true;
        for c in property_name.chars() {
            if c.is_ascii_uppercase() {
                if !segment_start {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
            segment_start = matches!(c, '.' | '[' | ']');
        }
        out
    }
}

/// Explicit path -> exposed name mapping, optionally scoped per target type.
#[derive(Clone, Default)]
pub struct SerializedNameMap {
    global: HashMap<String, String>,
    by_type: HashMap<String, HashMap<String, String>>,
    fallback: Option<Arc<dyn NameConverter>>,
}

impl SerializedNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, property_path: impl Into<String>, name: impl Into<String>) -> Self {
        self.global.insert(property_path.into(), name.into());
        self
    }

    #[must_use]
    pub fn with_type_name(
        mut self,
        target_type: impl Into<String>,
        property_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.by_type
            .entry(target_type.into())
            .or_default()
            .insert(property_path.into(), name.into());
        self
    }

    /// Converter used for paths with no explicit mapping.
    #[must_use]
    pub fn with_fallback<C: NameConverter + 'static>(mut self, fallback: C) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }
}

impl FromIterator<(String, String)> for SerializedNameMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            global: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl AdvancedNameConverter for SerializedNameMap {
    fn normalize(
        &self,
        property_name: &str,
        target_type: Option<&str>,
        _context: &ResolutionContext<'_>,
    ) -> String {
        let scoped = target_type
            .and_then(|t| self.by_type.get(t))
            .and_then(|names| names.get(property_name));
        if let Some(name) = scoped.or_else(|| self.global.get(property_name)) {
            return name.clone();
        }
        match &self.fallback {
            Some(fallback) => fallback.normalize(property_name),
            None => property_name.to_string(),
        }
    }
}

impl fmt::Debug for SerializedNameMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedNameMap")
            .field("global", &self.global)
            .field("by_type", &self.by_type)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
