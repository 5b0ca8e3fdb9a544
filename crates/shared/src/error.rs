use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PERSONS_NOT_FOUND: &str = "persons not found";
pub const NOT_CREATED: &str = "not created";
pub const NOT_FOUND: &str = "not found";
pub const NOT_AUTHORIZED: &str = "not authorized";
pub const FAULT_ALREADY_ACTIVE: &str = "fault already active";
pub const NO_ACTIVE_FAULT: &str = "no active fault";

/// Error tag carried by an `{"error": "<tag>"}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("gateway error: {tag}")]
#[serde(transparent)]
pub struct GatewayError {
    pub tag: String,
}

impl GatewayError {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}
