//! Shapes constraint violation lists into RFC 7807 problem documents.

pub mod error;
pub mod name_converter;
pub mod normalizer;
pub mod problem;
pub mod violation;

pub use error::NormalizerError;
pub use name_converter::{
    AdvancedNameConverter, CamelCaseToSnakeCase, NameConverter, NameResolver, ResolutionContext,
    SerializedNameMap,
};
pub use normalizer::ConstraintViolationListNormalizer;
pub use problem::{Payload, ProblemDocument, ViolationEntry, FORMAT, MIME_TYPE};
pub use violation::{Constraint, ConstraintViolationList, Violation};
