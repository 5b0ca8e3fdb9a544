use serde::{Deserialize, Serialize};

use crate::{
    domain::{CardNumber, FaultReport, Operator, OvenId, ProgramId},
    error::{GatewayError, NOT_CREATED},
    locale::Locale,
};

/// Response envelope of every action: `{"success": T}` or `{"error": "<tag>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResult<T> {
    Success(T),
    Error(GatewayError),
}

impl<T> ActionResult<T> {
    pub fn into_result(self) -> Result<T, GatewayError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, GatewayError>> for ActionResult<T> {
    fn from(value: Result<T, GatewayError>) -> Self {
        match value {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub identifier1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier3: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub operator1: Option<Operator>,
    #[serde(default)]
    pub operator2: Option<Operator>,
    #[serde(default)]
    pub operator3: Option<Operator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub persons: Vec<String>,
    pub warehouse: String,
    pub sector: String,
}

/// The create-card action answers flat: `{"success": true, "cardNumber": N}`
/// or `{"error": "<tag>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<CardNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<GatewayError>,
}

impl CreateCardReply {
    pub fn created(card_number: CardNumber) -> Self {
        Self {
            success: true,
            card_number: Some(card_number),
            error: None,
        }
    }

    /// A reply without an error tag that still lacks a card number counts
    /// as `not created`.
    pub fn into_result(self) -> Result<CardNumber, GatewayError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self.card_number {
            Some(number) if self.success => Ok(number),
            _ => Err(GatewayError::new(NOT_CREATED)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsRequest {
    pub persons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPositionsRequest {
    pub persons: Vec<String>,
    pub card: CardNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePositionRequest {
    pub persons: Vec<String>,
    pub card: CardNumber,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvenRequest {
    pub oven: OvenId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFaultRequest {
    pub oven: OvenId,
    pub lang: Locale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProgramResponse {
    pub program: Option<ProgramId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFaultResponse {
    pub fault: Option<FaultReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFaultRequest {
    pub oven: OvenId,
    pub fault_key: String,
    pub operators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishFaultRequest {
    pub oven: OvenId,
    pub operators: Vec<String>,
}

/// Empty request body for parameterless actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParams {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{NOT_CREATED, PERSONS_NOT_FOUND};

    #[test]
    fn success_envelope_uses_success_key() {
        let encoded =
            serde_json::to_value(ActionResult::Success(vec!["A".to_string()])).expect("encode");
        assert_eq!(encoded, json!({ "success": ["A"] }));
    }

    #[test]
    fn error_envelope_decodes_to_tag() {
        let decoded: ActionResult<Vec<String>> =
            serde_json::from_str(r#"{"error":"persons not found"}"#).expect("decode");
        let err = decoded.into_result().expect_err("error envelope");
        assert!(err.is(PERSONS_NOT_FOUND));
    }

    #[test]
    fn create_card_reply_is_flat() {
        let reply: CreateCardReply =
            serde_json::from_value(json!({ "success": true, "cardNumber": 42 })).expect("decode");
        assert_eq!(reply.into_result(), Ok(CardNumber(42)));
        assert_eq!(
            serde_json::to_value(CreateCardReply::created(CardNumber(7))).expect("encode"),
            json!({ "success": true, "cardNumber": 7 })
        );

        let reply: CreateCardReply =
            serde_json::from_value(json!({ "error": "persons not found" })).expect("decode");
        assert!(reply.into_result().expect_err("error").is(PERSONS_NOT_FOUND));

        let reply: CreateCardReply =
            serde_json::from_value(json!({ "success": true })).expect("decode");
        assert!(reply.into_result().expect_err("no number").is(NOT_CREATED));
    }

    #[test]
    fn fault_report_request_uses_camel_case() {
        let encoded = serde_json::to_value(ReportFaultRequest {
            oven: OvenId::new("oven-1"),
            fault_key: "door".into(),
            operators: vec!["1001".into()],
        })
        .expect("encode");
        assert_eq!(
            encoded,
            json!({ "oven": "oven-1", "faultKey": "door", "operators": ["1001"] })
        );
    }
}
