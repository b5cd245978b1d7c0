// ABOUTME: Upload error taxonomy for the Imgur SDK with developer descriptions
// ABOUTME: Maps transport, decoding, and API failures onto a fixed set of error codes

use crate::constants::{env, urls};
use const_format::concatcp;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const INVALID_IMAGE_HELP: &str = concatcp!(
    "See ",
    urls::IMGUR_ACCEPTED_TYPES,
    " for the image types Imgur accepts"
);

const INVALID_CLIENT_ID_HELP: &str = concatcp!(
    "Register your application at ",
    urls::IMGUR_REGISTER_APP,
    " and set ",
    env::CLIENT_ID
);

const CONFIGURATION_HELP: &str = concatcp!(
    "Set a client ID with --client-id, ",
    env::CLIENT_ID,
    " or the config file"
);

/// Numeric error codes. Every `UploadError` maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The Imgur API response was unreadable.
    UnreadableResponse = -1,
    /// No specific code; check the error's source.
    Unknown = 0,
    /// The image could not be found or had no usable representation.
    MissingImage = 1,
    /// Imgur considered the upload corrupt or unacceptable.
    InvalidImage = 400,
    /// Authentication with Imgur failed.
    InvalidClientId = 403,
    /// Application or source IP limits were hit.
    RateLimitExceeded = 429,
    /// Imgur failed without saying why.
    Unexplained = 500,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::UnreadableResponse => "unreadable-response",
            ErrorCode::Unknown => "unknown",
            ErrorCode::MissingImage => "missing-image",
            ErrorCode::InvalidImage => "invalid-image",
            ErrorCode::InvalidClientId => "invalid-client-id",
            ErrorCode::RateLimitExceeded => "rate-limit-exceeded",
            ErrorCode::Unexplained => "unexplained",
        };
        write!(f, "{} ({})", name, self.as_i32())
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image not found: {description}")]
    MissingImage {
        description: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Imgur rejected the image: {description}")]
    InvalidImage { description: Cow<'static, str> },

    #[error("Authentication failed. Check your Imgur client ID")]
    InvalidClientId { description: Cow<'static, str> },

    #[error("Rate limit exceeded. Please wait before uploading again")]
    RateLimitExceeded { description: Cow<'static, str> },

    #[error("Imgur returned an unexplained error (HTTP {status}): {description}")]
    Unexplained {
        status: u16,
        description: Cow<'static, str>,
    },

    #[error("Invalid API response format: {description}")]
    UnreadableResponse {
        description: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The upload worker panicked before producing an outcome.
    #[error("Upload failed unexpectedly: {0}")]
    Internal(String),
}

impl UploadError {
    pub fn missing_image(description: impl Into<Cow<'static, str>>) -> Self {
        UploadError::MissingImage {
            description: description.into(),
            source: None,
        }
    }

    pub fn unreadable(description: impl Into<Cow<'static, str>>) -> Self {
        UploadError::UnreadableResponse {
            description: description.into(),
            source: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            UploadError::MissingImage { .. } => ErrorCode::MissingImage,
            UploadError::InvalidImage { .. } => ErrorCode::InvalidImage,
            UploadError::InvalidClientId { .. } => ErrorCode::InvalidClientId,
            UploadError::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
            UploadError::Unexplained { .. } => ErrorCode::Unexplained,
            UploadError::UnreadableResponse { .. } => ErrorCode::UnreadableResponse,
            UploadError::Network { .. }
            | UploadError::Cancelled
            | UploadError::Configuration(_)
            | UploadError::Internal(_) => ErrorCode::Unknown,
        }
    }

    /// Describes what went wrong to someone reading the SDK source.
    /// Not meant for presentation to end users.
    pub fn developer_description(&self) -> Cow<'_, str> {
        match self {
            UploadError::MissingImage { description, .. }
            | UploadError::InvalidImage { description }
            | UploadError::InvalidClientId { description }
            | UploadError::RateLimitExceeded { description }
            | UploadError::Unexplained { description, .. }
            | UploadError::UnreadableResponse { description, .. } => {
                Cow::Borrowed(description.as_ref())
            }
            UploadError::Network { message, .. } => Cow::Borrowed(message.as_str()),
            UploadError::Cancelled => Cow::Borrowed("the upload was cancelled before completing"),
            UploadError::Configuration(message) | UploadError::Internal(message) => {
                Cow::Borrowed(message.as_str())
            }
        }
    }

    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            UploadError::MissingImage { .. } => {
                Some("Check that the file exists and contains image data")
            }
            UploadError::InvalidImage { .. } => Some(INVALID_IMAGE_HELP),
            UploadError::InvalidClientId { .. } => Some(INVALID_CLIENT_ID_HELP),
            UploadError::RateLimitExceeded { .. } => {
                Some("Wait a while before uploading again; limits apply per application and per IP")
            }
            UploadError::Network { .. } => Some("Check your internet connection and try again"),
            UploadError::Configuration(_) => Some(CONFIGURATION_HELP),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect to Imgur".to_string()
        } else if err.is_body() {
            "failed to send the image body".to_string()
        } else {
            err.to_string()
        };
        UploadError::Network {
            message,
            source: err,
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::MissingImage {
            description: Cow::Owned(format!("could not read image: {}", err)),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for UploadError {
    fn from(err: image::ImageError) -> Self {
        UploadError::MissingImage {
            description: Cow::Owned(format!("could not encode image: {}", err)),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::UnreadableResponse {
            description: Cow::Owned(format!("response was not valid JSON: {}", err)),
            source: Some(Box::new(err)),
        }
    }
}
