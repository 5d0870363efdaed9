//! Normalized dispatch results.

use serde::Serialize;
use serde_json::Value;

use super::error::DispatchError;

/// Terminal outcome of one logical call: the parsed JSON body, or why there
/// is none.
pub type Response = Result<Value, DispatchError>;

/// Envelope a failed tool call hands to its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolError {
    pub error: String,
}

impl From<&DispatchError> for ToolError {
    fn from(error: &DispatchError) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// The value a tool returns to its host.
///
/// Failures become `{"error": "<message>"}` so the host always receives JSON.
pub fn into_tool_output(response: Response) -> Value {
    match response {
        Ok(body) => body,
        Err(error) => {
            let envelope = ToolError::from(&error);
            serde_json::to_value(&envelope)
                .unwrap_or_else(|_| Value::String(envelope.error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_passes_body_through() {
        let body = json!({"status": true, "result": {"id": 1}});
        assert_eq!(into_tool_output(Ok(body.clone())), body);
    }

    #[test]
    fn test_failure_becomes_error_envelope() {
        let output = into_tool_output(Err(DispatchError::Http {
            status: 404,
            body: "Not Found".to_string(),
        }));
        assert_eq!(output, json!({"error": "HTTP error: 404 - Not Found"}));
    }

    #[test]
    fn test_tool_error_serializes_as_error_field() {
        let envelope = ToolError::from(&DispatchError::CredentialNotConfigured);
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"error":"credential not configured"}"#
        );
    }
}
