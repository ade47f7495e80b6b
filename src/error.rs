//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, XbrlError>;

#[derive(Debug, Error)]
pub enum XbrlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error in {uri}: {source}")]
    Xml {
        uri: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("(de)serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document error in {uri}: {message}")]
    Document { uri: String, message: String },
}

impl XbrlError {
    /// Shorthand for a document-scoped failure (fatal to that document only).
    pub fn document(uri: impl Into<String>, message: impl Into<String>) -> Self {
        XbrlError::Document {
            uri: uri.into(),
            message: message.into(),
        }
    }
}
