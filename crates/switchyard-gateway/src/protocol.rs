use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
}

/// Reply to one named operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: OperationStatus,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub message: String,
}

impl OperationResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: OperationStatus::Success,
            data,
            message: String::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Error,
            data: serde_json::Value::Null,
            message: message.into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(OperationResponse::err("Unknown operation: nope")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Unknown operation: nope");
        assert!(json["data"].is_null());

        let ok = serde_json::to_value(OperationResponse::ok(serde_json::json!({"a": 1}))).unwrap();
        assert_eq!(ok["status"], "success");
    }
}
