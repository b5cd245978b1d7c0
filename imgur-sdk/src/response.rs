// ABOUTME: Parsing and classification of Imgur upload responses
// ABOUTME: Maps HTTP status and the JSON envelope onto a hosted URL or an UploadError

use crate::constants::headers;
use crate::error::UploadError;
use reqwest::StatusCode;
use serde::Deserialize;
use std::borrow::Cow;
use url::Url;

/// The envelope every Imgur API response is wrapped in.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<ImageData>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    link: Option<String>,
    /// Either a plain message or an object with a `message` field.
    #[serde(default)]
    error: Option<serde_json::Value>,
}

pub(crate) async fn parse_response(response: reqwest::Response) -> Result<Url, UploadError> {
    let status = response.status();
    log_rate_limits(response.headers());

    let body = response.bytes().await?;
    log::debug!("Imgur responded {} with {} bytes", status, body.len());

    classify(status, &body)
}

/// Classify a complete response. Pure so it can be exercised without a server.
pub(crate) fn classify(status: StatusCode, body: &[u8]) -> Result<Url, UploadError> {
    let envelope = serde_json::from_slice::<Envelope>(body);

    if !status.is_success() {
        let message = envelope.ok().as_ref().and_then(server_message);
        return Err(error_for_status(status.as_u16(), message));
    }

    let envelope = envelope?;

    // Imgur occasionally reports failures inside a 200 envelope.
    if envelope.success == Some(false) {
        let message = server_message(&envelope);
        return Err(match envelope.status.filter(|s| *s >= 400) {
            Some(code) => error_for_status(code, message),
            None => UploadError::unreadable(format!(
                "success is false without an error status: {}",
                message.as_deref().unwrap_or("no message")
            )),
        });
    }

    let link = envelope
        .data
        .and_then(|data| data.link)
        .ok_or_else(|| UploadError::unreadable("response has no data.link"))?;

    let url = Url::parse(&link).map_err(|e| UploadError::UnreadableResponse {
        description: Cow::Owned(format!("data.link is not a URL: {}", link)),
        source: Some(Box::new(e)),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UploadError::unreadable(format!(
            "data.link has unexpected scheme: {}",
            link
        )));
    }

    Ok(url)
}

fn server_message(envelope: &Envelope) -> Option<String> {
    match envelope.data.as_ref()?.error.as_ref()? {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Object(fields) => fields
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn error_for_status(status: u16, message: Option<String>) -> UploadError {
    let description: Cow<'static, str> = match message {
        Some(message) => Cow::Owned(message),
        None => Cow::Owned(format!(
            "HTTP {} with no explanation",
            status
        )),
    };

    match status {
        400 => UploadError::InvalidImage { description },
        401 | 403 => UploadError::InvalidClientId { description },
        429 => UploadError::RateLimitExceeded { description },
        _ => UploadError::Unexplained {
            status,
            description,
        },
    }
}

fn log_rate_limits(headers: &reqwest::header::HeaderMap) {
    let remaining = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    if let Some(client) = remaining(headers::CLIENT_REMAINING) {
        log::debug!("Imgur client uploads remaining: {}", client);
    }
    if let Some(user) = remaining(headers::USER_REMAINING) {
        log::debug!("Imgur uploads remaining for this IP: {}", user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_success_yields_link() {
        let response = body(json!({
            "data": { "id": "aBcD123", "link": "https://i.imgur.com/aBcD123.png" },
            "success": true,
            "status": 200
        }));

        let url = classify(StatusCode::OK, &response).unwrap();
        assert_eq!(url.as_str(), "https://i.imgur.com/aBcD123.png");
    }

    #[test]
    fn test_bad_request_is_invalid_image() {
        let response = body(json!({
            "data": { "error": "Image format not supported", "request": "/3/image", "method": "POST" },
            "success": false,
            "status": 400
        }));

        let err = classify(StatusCode::BAD_REQUEST, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidImage);
        assert_eq!(err.developer_description(), "Image format not supported");
    }

    #[test]
    fn test_forbidden_is_invalid_client_id() {
        let response = body(json!({
            "data": { "error": "Invalid client_id", "request": "/3/image", "method": "POST" },
            "success": false,
            "status": 403
        }));

        let err = classify(StatusCode::FORBIDDEN, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidClientId);
    }

    #[test]
    fn test_unauthorized_is_invalid_client_id() {
        let err = classify(StatusCode::UNAUTHORIZED, b"").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidClientId);
    }

    #[test]
    fn test_too_many_requests_is_rate_limit() {
        let response = body(json!({
            "data": { "error": { "code": 429, "message": "Too Many Requests", "type": "ImgurException" } },
            "success": false,
            "status": 429
        }));

        let err = classify(StatusCode::TOO_MANY_REQUESTS, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimitExceeded);
        assert_eq!(err.developer_description(), "Too Many Requests");
    }

    #[test]
    fn test_server_error_is_unexplained() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unexplained);
        assert!(err.developer_description().contains("500"));
    }

    #[test]
    fn test_other_status_is_unexplained() {
        let err = classify(StatusCode::NOT_FOUND, b"{}").unwrap_err();
        match err {
            UploadError::Unexplained { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected unexplained error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_success_is_unreadable() {
        let err = classify(StatusCode::OK, b"<html>maintenance</html>").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
    }

    #[test]
    fn test_success_without_link_is_unreadable() {
        let response = body(json!({ "data": { "id": "x" }, "success": true, "status": 200 }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
    }

    #[test]
    fn test_malformed_link_is_unreadable() {
        let response = body(json!({ "data": { "link": "not a url" }, "success": true }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
    }

    #[test]
    fn test_non_http_link_is_unreadable() {
        let response = body(json!({ "data": { "link": "ftp://i.imgur.com/a.png" }, "success": true }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
    }

    #[test]
    fn test_failure_inside_ok_envelope() {
        let response = body(json!({
            "data": { "error": "Rate limit" },
            "success": false,
            "status": 429
        }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_failure_inside_ok_envelope_without_status() {
        let response = body(json!({
            "data": { "error": "upstream hiccup" },
            "success": false
        }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
        assert!(err.developer_description().contains("upstream hiccup"));

        let response = body(json!({ "success": false, "status": 200 }));
        let err = classify(StatusCode::OK, &response).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnreadableResponse);
    }
}
