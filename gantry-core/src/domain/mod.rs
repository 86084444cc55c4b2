//! Core domain types
//!
//! These types are transient request/response values. Every field a caller
//! may leave out is an `Option` so that the adapter can report which required
//! argument is missing instead of failing at deserialization.

pub mod build;
pub mod credential;
pub mod membership;
pub mod pipeline;

/// Error returned when parsing one of the domain enums from text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}
