use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::service::ServiceEntry;

/// Error taxonomy carried in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    FileNotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_i32(&self) -> i32 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::FileNotFound => 404,
            ErrorCode::InternalError => 500,
        }
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            400 => Some(ErrorCode::BadRequest),
            401 => Some(ErrorCode::Unauthorized),
            404 => Some(ErrorCode::FileNotFound),
            500 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        ErrorCode::from_i32(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code {}", code)))
    }
}

/// Uniform response envelope.
///
/// `is_successful == false` always comes with an `error_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBase {
    pub is_successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ResponseBase {
    pub fn success() -> Self {
        Self {
            is_successful: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            is_successful: false,
            error_code: Some(code),
            error_message: Some(message.into()),
        }
    }
}

/// Response of `POST /storage/save-file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    pub file_name: Option<String>,
}

impl SaveFileResponse {
    pub fn saved(file_name: String) -> Self {
        Self {
            base: ResponseBase::success(),
            file_name: Some(file_name),
        }
    }
}

/// Response of `GET /storage/service`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListResponse {
    #[serde(flatten)]
    pub base: ResponseBase,
    pub service_data: Vec<ServiceEntry>,
}

impl ServiceListResponse {
    pub fn listed(service_data: Vec<ServiceEntry>) -> Self {
        Self {
            base: ResponseBase::success(),
            service_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_has_no_error_fields() {
        let value = serde_json::to_value(ResponseBase::success()).unwrap();
        assert_eq!(value, serde_json::json!({ "isSuccessful": true }));
    }

    #[test]
    fn test_failure_envelope_carries_numeric_code() {
        let value =
            serde_json::to_value(ResponseBase::failure(ErrorCode::Unauthorized, "nope")).unwrap();
        assert_eq!(value["isSuccessful"], false);
        assert_eq!(value["errorCode"], 401);
        assert_eq!(value["errorMessage"], "nope");
    }

    #[test]
    fn test_save_file_response_flattens_envelope() {
        let value = serde_json::to_value(SaveFileResponse::saved("a.png".to_string())).unwrap();
        assert_eq!(value["isSuccessful"], true);
        assert_eq!(value["fileName"], "a.png");
        assert!(value.get("errorCode").is_none());
    }

    #[test]
    fn test_error_code_rejects_unknown_value() {
        assert!(serde_json::from_str::<ErrorCode>("403").is_err());
        assert_eq!(
            serde_json::from_str::<ErrorCode>("404").unwrap(),
            ErrorCode::FileNotFound
        );
    }

    #[test]
    fn test_service_list_response_shape() {
        let entry = ServiceEntry {
            id: 1,
            service_type: 2,
            url: "https://cdn.example.com/a.mp3".to_string(),
        };
        let value = serde_json::to_value(ServiceListResponse::listed(vec![entry])).unwrap();
        assert_eq!(value["isSuccessful"], true);
        assert_eq!(value["serviceData"][0]["type"], 2);
    }
}
