//! Error types for pbilink.

use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sheet the run depends on is not in the workbook
    #[error("Sheet '{0}' not found in workbook")]
    MissingSheet(String),

    /// A required cell or column is empty or absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Spreadsheet package is malformed or unreadable
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Spreadsheet read error: {0}")]
    Calamine(#[from] calamine::XlsxError),

    /// Non-success response from the work-item service
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn workbook(message: impl Into<String>) -> Self {
        Self::Workbook(message.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(err))
    }
}
