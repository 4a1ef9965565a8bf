use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnitError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Backend rejected request on '{table}' (status {status}): {message}")]
    BackendError {
        table: String,
        status: u16,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Insert into '{table}' returned no generated id")]
    MissingGeneratedId { table: String },
}

impl UnitError {
    pub fn validation(message: impl Into<String>) -> Self {
        UnitError::ValidationError {
            message: message.into(),
        }
    }

    /// Short message suitable for a terminal or a toast.
    pub fn user_friendly_message(&self) -> String {
        match self {
            UnitError::ApiError(_) => "Could not reach the database service".to_string(),
            UnitError::BackendError { table, .. } => {
                format!("The database rejected a change to '{}'", table)
            }
            UnitError::IoError(e) => format!("File access failed: {}", e),
            UnitError::SerializationError(_) => "Malformed data received or sent".to_string(),
            UnitError::ConfigValidationError { field, .. }
            | UnitError::InvalidConfigValueError { field, .. } => {
                format!("Configuration problem in '{}'", field)
            }
            UnitError::ValidationError { message } => message.clone(),
            UnitError::MissingGeneratedId { table } => {
                format!("Row created in '{}' but no id came back", table)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, UnitError>;
