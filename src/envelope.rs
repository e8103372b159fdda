use std::collections::BTreeMap;

use axum::Json;
use serde::Serialize;

/// Field name → messages, in the shape the client renders under each input.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Uniform JSON wrapper for every API response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        })
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
        })
    }

    pub fn failure(message: impl Into<String>, errors: Option<FieldErrors>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: errors.filter(|e| !e.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_envelope_omits_message_and_errors() {
        let Json(env) = Envelope::data(vec![1, 2]);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn failure_drops_empty_error_map() {
        let env = Envelope::failure("Email already registered", Some(FieldErrors::new()));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Email already registered" })
        );
    }
}
