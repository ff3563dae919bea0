/*!
 * Tests for error types
 */

use std::time::Duration;

use mdxlate::errors::{AppError, ConfigError, DocumentError, ProviderError, TranslationError};

#[test]
fn test_provider_error_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 429 - Too many requests");

    let timeout = ProviderError::Timeout(Duration::from_secs(30));
    assert_eq!(timeout.to_string(), "Request timed out after 30s");
}

#[test]
fn test_translation_error_fromProviderError_shouldWrap() {
    let error: TranslationError = ProviderError::ConnectionError("refused".to_string()).into();
    assert!(matches!(error, TranslationError::Provider(ProviderError::ConnectionError(_))));
    assert_eq!(error.to_string(), "Provider error: Connection error: refused");
}

#[test]
fn test_document_error_display_shouldUseOneBasedLines() {
    let error = DocumentError::ReservedCharacters { line: 3 };
    assert_eq!(error.to_string(), "Document contains reserved placeholder characters at line 3");

    let mismatch = DocumentError::TranslationCountMismatch { expected: 4, actual: 2 };
    assert_eq!(mismatch.to_string(), "Expected 4 translations but received 2");
}

#[test]
fn test_config_error_display_shouldNameVariable() {
    let error = ConfigError::MissingCredential {
        env_var: "TILMOCH_API_KEY".to_string(),
    };
    assert!(error.to_string().contains("TILMOCH_API_KEY"));
}

#[test]
fn test_app_error_conversions_shouldPickVariant() {
    let from_document: AppError = DocumentError::MissingPlaceholder(1).into();
    assert!(matches!(from_document, AppError::Document(_)));

    let from_io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(from_io, AppError::File(_)));

    let from_anyhow: AppError = anyhow::anyhow!("something odd").into();
    assert_eq!(from_anyhow.to_string(), "Unknown error: something odd");
}

#[test]
fn test_app_error_fromFileFailure_shouldLookThroughContext() {
    use anyhow::Context;

    let segmenting: anyhow::Result<()> =
        Err(DocumentError::ReservedCharacters { line: 4 }).context("Failed to segment page.mdx");
    let error = AppError::from_file_failure(segmenting.unwrap_err());
    assert!(matches!(error, AppError::Document(DocumentError::ReservedCharacters { line: 4 })));

    let reading: anyhow::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
        .context("Failed to read document: page.mdx");
    assert!(matches!(AppError::from_file_failure(reading.unwrap_err()), AppError::File(_)));

    let other = AppError::from_file_failure(anyhow::anyhow!("inner").context("outer"));
    assert_eq!(other.to_string(), "Unknown error: outer: inner");
}
