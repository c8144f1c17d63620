use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("PDF extraction failed: {message}")]
    PdfError { message: String },

    #[error("LLM API returned {status}: {message}")]
    LlmError { status: u16, message: String },

    #[error("LLM returned an empty response (model: {model})")]
    EmptyResponse { model: String },

    #[error("Model output does not match the work-order schema: {message}")]
    SchemaError { message: String, raw_output: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Document,
    Model,
    Schema,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::PdfError { .. } => ErrorCategory::Document,
            EtlError::LlmError { .. } | EtlError::EmptyResponse { .. } => ErrorCategory::Model,
            EtlError::SerializationError(_)
            | EtlError::SchemaError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Schema,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼：Medium 代表重跑可能成功
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ApiError(_) | EtlError::EmptyResponse { .. } => ErrorSeverity::Medium,
            EtlError::LlmError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            EtlError::SchemaError { .. } => ErrorSeverity::Medium,
            EtlError::LlmError { .. }
            | EtlError::PdfError { .. }
            | EtlError::SerializationError(_)
            | EtlError::ValidationError { .. } => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and the Gemini API base URL".to_string()
            }
            EtlError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            EtlError::PdfError { .. } => {
                "Make sure the input is a text-based PDF (scanned images need OCR first)"
                    .to_string()
            }
            EtlError::LlmError { status, .. } => match status {
                401 | 403 => "Check that GOOGLE_API_KEY is valid".to_string(),
                404 => "Check the configured model name".to_string(),
                429 => "Rate limited; wait a minute and run again".to_string(),
                _ => "Run again later or switch to the fallback model".to_string(),
            },
            EtlError::EmptyResponse { .. } => {
                "Run again; the model occasionally returns no content".to_string()
            }
            EtlError::SchemaError { .. } => {
                "Inspect the raw model output above and run again".to_string()
            }
            EtlError::SerializationError(_) | EtlError::ValidationError { .. } => {
                "Inspect the model output; the response could not be validated".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Provide a value for '{}' (flag, TOML or environment)", field)
            }
            EtlError::InvalidConfigValueError { field, .. }
            | EtlError::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            EtlError::ConfigError { .. } => "Review the configuration".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(_) => "Could not reach the Gemini API".to_string(),
            EtlError::IoError(e) => format!("File error: {}", e),
            EtlError::PdfError { message } => format!("Could not read the PDF: {}", message),
            EtlError::LlmError { status, .. } => {
                format!("The Gemini API rejected the request (HTTP {})", status)
            }
            EtlError::EmptyResponse { model } => format!("{} returned no content", model),
            EtlError::SchemaError { message, .. } => {
                format!("Error parsing/validating JSON: {}", message)
            }
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定的程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// 模型原始輸出（僅 SchemaError 帶有）
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            EtlError::SchemaError { raw_output, .. } => Some(raw_output),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
