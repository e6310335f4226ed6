use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("API request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Persistence error on key '{key}': {message}")]
    Persistence { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CatalogError {
    pub fn persistence(key: &str, message: impl Into<String>) -> Self {
        Self::Persistence {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// True for failures of the remote catalog source.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::Persistence { .. } | Self::Io(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => {
                "The university directory could not be reached.".to_string()
            }
            ErrorCategory::Storage => "Saved selections could not be read or written.".to_string(),
            ErrorCategory::Data => "Saved data was in an unexpected format.".to_string(),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Network(e) if e.is_timeout() => {
                "The request timed out; raise source.timeout_seconds or try again later"
            }
            Self::Network(_) | Self::HttpStatus { .. } => {
                "Check your connection and reload the catalog"
            }
            Self::Persistence { .. } | Self::Io(_) => {
                "Check that the storage file is writable (storage.path)"
            }
            Self::Serialization(_) => "Delete the storage file to reset saved selections",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags and run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
