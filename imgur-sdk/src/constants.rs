// ABOUTME: Centralized constants for the Imgur SDK
// ABOUTME: Contains endpoint URLs, timeouts, upload limits, and environment keys

/// HTTP and request timeouts
pub mod timeouts {
    use std::time::Duration;

    /// Default timeout for a whole upload exchange
    pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
}

/// Imgur API URLs
pub mod urls {
    /// Anonymous image upload endpoint
    pub const IMGUR_UPLOAD_ENDPOINT: &str = "https://api.imgur.com/3/image";

    /// Where applications register for a client ID
    pub const IMGUR_REGISTER_APP: &str = "https://api.imgur.com/oauth2/addclient";

    /// Accepted image types
    pub const IMGUR_ACCEPTED_TYPES: &str = "https://imgur.com/faq#types";
}

/// Upload body and multipart constants
pub mod upload {
    /// Size of the chunks handed to the transport; progress advances per chunk
    pub const CHUNK_SIZE: usize = 64 * 1024;

    /// Imgur rejects files above this size. Not enforced client-side.
    pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Filename stem used when the caller supplies none
    pub const DEFAULT_FILENAME_STEM: &str = "image";

    /// Content type for parts whose type can't be guessed from the filename
    pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

    /// Multipart field names understood by the upload endpoint
    pub const FIELD_IMAGE: &str = "image";
    pub const FIELD_TITLE: &str = "title";
    pub const FIELD_NAME: &str = "name";
    pub const FIELD_TYPE: &str = "type";

    /// Value of the `type` field for binary file uploads
    pub const TYPE_FILE: &str = "file";
}

/// Environment variables read by the SDK
pub mod env {
    /// Default client ID for clients created with `ImgurClient::from_env`
    pub const CLIENT_ID: &str = "IMGUR_CLIENT_ID";
}

/// Response headers worth logging
pub mod headers {
    pub const CLIENT_REMAINING: &str = "x-ratelimit-clientremaining";
    pub const USER_REMAINING: &str = "x-ratelimit-userremaining";
}
