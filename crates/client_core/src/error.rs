use floor_shared::error::GatewayError;
use thiserror::Error;

/// Input rejected before it reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one operator identifier is required")]
    MissingOperator,
    #[error("operator identifier '{0}' must be a non-empty number")]
    InvalidIdentifier(String),
    #[error("operator identifier '{0}' was entered twice")]
    DuplicateIdentifier(String),
    #[error("a warehouse must be selected")]
    MissingWarehouse,
    #[error("unknown warehouse '{0}'")]
    UnknownWarehouse(String),
    #[error("a sector must be selected")]
    MissingSector,
    #[error("unknown sector '{0}'")]
    UnknownSector(String),
    #[error("a fault type must be selected")]
    MissingFaultType,
    #[error("unknown fault type '{0}'")]
    UnknownFaultType(String),
    #[error("no operator is logged in")]
    NotLoggedIn,
    #[error("no {0} is selected")]
    NothingSelected(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Gateway,
    Network,
    Persistence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("network failure: {0}")]
    Network(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Gateway(_) => ErrorKind::Gateway,
            Self::Network(_) => ErrorKind::Network,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn gateway_tag(&self) -> Option<&str> {
        match self {
            Self::Gateway(err) => Some(err.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_gateway(&self, tag: &str) -> bool {
        self.gateway_tag() == Some(tag)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Persistence(value.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        Self::Persistence(value.to_string())
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
