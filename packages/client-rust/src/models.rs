//! Wire types exchanged with the REST backend (camelCase JSON).

use serde::{Deserialize, Serialize};

/// Signed-in resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Service provider a visitor identifies as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
}

/// House served by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: String,
    pub name: String,
}

/// Lifecycle of a communication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// A visitor's request to talk to a house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationRequest {
    pub id: String,
    pub visitor_name: String,
    pub status: RequestStatus,
}

/// Payload for creating a communication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommunicationRequest {
    pub provider_id: String,
    pub house_id: String,
    pub visitor_name: String,
    pub visitor_contact: String,
    pub initial_message: String,
}

/// A resident's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub house_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ValidateRequest {
    pub status: Decision,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn communication_request_uses_camel_case_and_upper_status() {
        let parsed: CommunicationRequest = serde_json::from_value(json!({
            "id": "r1",
            "visitorName": "Ana",
            "status": "ACCEPTED"
        }))
        .unwrap();
        assert_eq!(parsed.visitor_name, "Ana");
        assert_eq!(parsed.status, RequestStatus::Accepted);
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let parsed: CommunicationRequest = serde_json::from_value(json!({
            "id": "r2",
            "visitorName": "Bo",
            "status": "EXPIRED"
        }))
        .unwrap();
        assert_eq!(parsed.status, RequestStatus::Unknown);
    }

    #[test]
    fn login_response_house_is_optional() {
        let parsed: LoginResponse = serde_json::from_value(json!({
            "token": "t",
            "user": { "id": "u1", "name": "Ana", "email": "ana@example.com" }
        }))
        .unwrap();
        assert!(parsed.house_id.is_none());
    }

    #[test]
    fn new_request_serializes_camel_case() {
        let payload = NewCommunicationRequest {
            provider_id: "p1".into(),
            house_id: "h1".into(),
            visitor_name: "Ana".into(),
            visitor_contact: "555".into(),
            initial_message: "hello".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["providerId"], "p1");
        assert_eq!(value["initialMessage"], "hello");
    }

    #[test]
    fn validate_body_carries_decision() {
        let body = serde_json::to_value(ValidateRequest {
            status: Decision::Rejected,
        })
        .unwrap();
        assert_eq!(body, json!({ "status": "REJECTED" }));
    }
}
