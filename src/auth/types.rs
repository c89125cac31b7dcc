use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body of a successful `POST /api/auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

impl fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshResponse")
            .field("access_token", &"***")
            .finish()
    }
}

/// Body of `GET /api/auth/validate`. Only `valid` is guaranteed.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(value) => value,
            StringOrNumber::Number(value) => value.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|value| value.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_accepts_numeric_user_id() {
        let response: LoginResponse = serde_json::from_value(json!({
            "accessToken": "A1",
            "refreshToken": "R1",
            "userId": 42,
            "username": "alice",
            "email": "alice@example.com",
            "roles": ["employee"]
        }))
        .unwrap();
        assert_eq!(response.user_id, "42");
        assert_eq!(response.roles, vec!["employee".to_string()]);
    }

    #[test]
    fn login_response_tolerates_missing_optional_fields() {
        let response: LoginResponse = serde_json::from_value(json!({
            "accessToken": "A1",
            "refreshToken": "R1",
            "userId": "u-1",
            "username": "alice"
        }))
        .unwrap();
        assert_eq!(response.user_id, "u-1");
        assert!(response.email.is_none());
        assert!(response.roles.is_empty());
    }

    #[test]
    fn validation_response_only_requires_valid() {
        let response: ValidationResponse =
            serde_json::from_value(json!({"valid": false, "message": "Token expired"})).unwrap();
        assert!(!response.valid);
        assert_eq!(response.message.as_deref(), Some("Token expired"));

        let response: ValidationResponse = serde_json::from_value(
            json!({"valid": true, "userId": 7, "username": "alice", "roles": ["ROLE_ADMIN"]}),
        )
        .unwrap();
        assert_eq!(response.user_id.as_deref(), Some("7"));
    }

    #[test]
    fn requests_serialize_camel_case() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "R1" }).unwrap();
        assert_eq!(body, json!({"refreshToken": "R1"}));
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let response = LoginResponse {
            access_token: "A1-secret".to_string(),
            refresh_token: "R1-secret".to_string(),
            user_id: "1".to_string(),
            username: "alice".to_string(),
            email: None,
            roles: Vec::new(),
        };
        let rendered = format!("{response:?}");
        assert!(!rendered.contains("A1-secret"));
        assert!(!rendered.contains("R1-secret"));

        let request = LoginRequest {
            username: "alice",
            password: "pw",
        };
        assert!(!format!("{request:?}").contains("\"pw\""));
    }
}
