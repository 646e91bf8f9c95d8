//! Error types for the records engine
//!
//! Errors are classified by who can fix them:
//! - User-correctable: validation failures, bad field definitions, bad setting paths
//! - Requires admin login: settings mutation while logged out
//! - Storage: the durable write or its serialization failed
//!
//! Missing records and malformed durable state are not errors here: the former
//! is a no-op, the latter is logged and replaced by defaults.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Field key: a standard key such as `units`, or a custom field id.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error types for store and session operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid field definition: {0}")]
    InvalidField(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Administrator login required")]
    AdminRequired,

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

impl StoreError {
    /// Returns true if the caller can fix the input and retry
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::InvalidField(_) | StoreError::InvalidSetting(_)
        )
    }

    /// Per-field failures, empty for every other kind.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            StoreError::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "Correct the highlighted fields and submit again.",
            StoreError::InvalidField(_) => "Give the field a name before saving it.",
            StoreError::InvalidSetting(_) => "Check the setting name and value type.",
            StoreError::AdminRequired => "Log in as the administrator first.",
            StoreError::IoError(_) => "Check file permissions and disk space.",
            StoreError::SerializeError(_) => "The data could not be encoded. Try again.",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializeError(err.to_string())
    }
}

/// Serializable error representation for the UI boundary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub message: String,
    pub error_type: ErrorType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Validation,
    Unauthorized,
    Storage,
}

impl From<&StoreError> for CommandError {
    fn from(err: &StoreError) -> Self {
        let error_type = match err {
            StoreError::AdminRequired => ErrorType::Unauthorized,
            StoreError::IoError(_) | StoreError::SerializeError(_) => ErrorType::Storage,
            _ => ErrorType::Validation,
        };

        CommandError {
            message: err.to_string(),
            error_type,
            field_errors: err.field_errors().to_vec(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = StoreError::Validation(vec![
            FieldError::new("units", "Must sell at least 1 unit"),
            FieldError::new("region", "Please select a region"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: units: Must sell at least 1 unit; region: Please select a region"
        );
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_command_error_carries_field_errors() {
        let err = StoreError::Validation(vec![FieldError::new("item", "Please select an item")]);
        let cmd = CommandError::from(&err);
        assert_eq!(cmd.error_type, ErrorType::Validation);
        assert_eq!(cmd.field_errors.len(), 1);

        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["errorType"], "validation");
        assert_eq!(json["fieldErrors"][0]["field"], "item");
    }

    #[test]
    fn test_storage_errors_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::from(io);
        assert!(!err.is_user_correctable());
        assert_eq!(CommandError::from(&err).error_type, ErrorType::Storage);
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_admin_required_is_unauthorized() {
        let cmd = CommandError::from(StoreError::AdminRequired);
        assert_eq!(cmd.error_type, ErrorType::Unauthorized);
        let json = serde_json::to_value(&cmd).unwrap();
        assert!(json.get("fieldErrors").is_none());
    }
}
