// ABOUTME: Test helper utilities for mocking Imgur API responses and server
// ABOUTME: Provides mockito-based helpers for unit testing upload interactions

use crate::{CallbackQueue, ImgurClient};
use mockito::{Server, ServerGuard};
use secrecy::SecretString;
use serde_json::json;

pub const UPLOAD_PATH: &str = "/3/image";
pub const TEST_CLIENT_ID: &str = "test-client";

pub async fn mock_imgur_server() -> ServerGuard {
    Server::new_async().await
}

pub fn test_client(server: &ServerGuard) -> ImgurClient {
    ImgurClient::builder()
        .client_id(SecretString::new(TEST_CLIENT_ID.to_string().into_boxed_str()))
        .endpoint(Some(format!("{}{}", server.url(), UPLOAD_PATH)))
        .build()
        .expect("test client should build")
}

pub fn test_client_with_queue(server: &ServerGuard, queue: CallbackQueue) -> ImgurClient {
    ImgurClient::builder()
        .client_id(SecretString::new(TEST_CLIENT_ID.to_string().into_boxed_str()))
        .endpoint(Some(format!("{}{}", server.url(), UPLOAD_PATH)))
        .callback_queue(Some(queue))
        .build()
        .expect("test client should build")
}

pub fn mock_upload_success_response(link: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": "aBcD123",
            "title": null,
            "description": null,
            "datetime": 1700000000,
            "type": "image/png",
            "animated": false,
            "width": 2,
            "height": 2,
            "size": 72,
            "views": 0,
            "bandwidth": 0,
            "deletehash": "x1Y2z3",
            "name": "",
            "link": link
        },
        "success": true,
        "status": 200
    })
}

pub fn mock_upload_error_response(status: usize, message: &str) -> serde_json::Value {
    json!({
        "data": {
            "error": message,
            "request": "/3/image",
            "method": "POST"
        },
        "success": false,
        "status": status
    })
}
