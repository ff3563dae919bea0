/*!
 * Error types for the mdxlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The request did not complete in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while segmenting or reassembling a document
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// The source already contains the characters reserved for placeholders
    #[error("Document contains reserved placeholder characters at line {line}")]
    ReservedCharacters {
        /// 1-based line number of the first offending line
        line: usize,
    },

    /// Reconciliation found a different number of translations than units
    #[error("Expected {expected} translations but received {actual}")]
    TranslationCountMismatch {
        /// Number of translation units in the document
        expected: usize,
        /// Number of translations handed to the reconciler
        actual: usize,
    },

    /// A placeholder was never substituted
    #[error("Placeholder {0} is missing from the document template")]
    MissingPlaceholder(usize),

    /// A placeholder appeared more than once
    #[error("Placeholder {0} appears more than once in the document template")]
    DuplicatePlaceholder(usize),

    /// The template referenced a placeholder with no matching unit
    #[error("Unknown placeholder {0} in the document template")]
    UnknownPlaceholder(usize),
}

/// Errors in the user configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No translation credential could be found
    #[error("Translation API key not found: set the {env_var} environment variable or `translation.api_key` in the config file")]
    MissingCredential {
        /// Name of the environment variable that was checked
        env_var: String,
    },

    /// A configuration value is outside its allowed range
    #[error("Invalid configuration value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned nothing for a non-empty text
    #[error("Provider returned an empty translation")]
    EmptyTranslation,

    /// The admission gate was closed while waiting for a permit
    #[error("Admission gate closed")]
    GateClosed,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from document processing
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Classify the error that made one file fail.
    ///
    /// Document and I/O errors keep their type; anything else is carried as
    /// `Unknown` with its full context chain.
    pub fn from_file_failure(error: anyhow::Error) -> Self {
        let error = match error.downcast::<DocumentError>() {
            Ok(document) => return Self::Document(document),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(io) => Self::File(io.to_string()),
            Err(error) => Self::Unknown(format!("{:#}", error)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
