use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads configuration, fetches report data, or emits the workbook.
///
/// Failures raised while fetching or normalizing a single view
/// ([`ReportError::UnknownProvider`], [`ReportError::UnknownView`],
/// [`ReportError::Transport`], [`ReportError::Api`],
/// [`ReportError::Schema`]) are contained by the orchestration layer: the
/// view contributes nothing and the run continues. Failures raised while
/// writing the workbook abort the whole export.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure while talking to the billing API.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The billing API answered with a non-success status code.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Requested provider is not declared in the view registry.
    #[error("unknown cloud provider: {0}")]
    UnknownProvider(String),

    /// Requested view is not declared for the given provider.
    #[error("unknown view '{view}' for provider {provider}")]
    UnknownView { provider: String, view: String },

    /// A view response did not follow the expected structure.
    #[error("schema error in view '{view}': {reason}")]
    Schema { view: String, reason: String },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the user provides a path that does not exist.
    #[error("views file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when no API key is available in the environment.
    #[error("CLOUDABILITY_API_KEY environment variable is not set")]
    MissingApiKey,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
