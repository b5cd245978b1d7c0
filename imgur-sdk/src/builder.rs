// ABOUTME: Builder pattern implementation for ImgurClient configuration
// ABOUTME: Provides type-safe configuration with compile-time validation

use crate::asset::AssetResolver;
use crate::constants::timeouts;
use crate::dispatch::CallbackQueue;
use crate::error::UploadError;
use crate::ImgurClient;
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use typed_builder::TypedBuilder;
use url::Url;

#[derive(TypedBuilder)]
#[builder(build_method(into = Result<ImgurClient, UploadError>))]
pub struct ImgurClientConfig {
    pub client_id: SecretString,

    #[builder(default = timeouts::HTTP_REQUEST_TIMEOUT)]
    pub timeout: Duration,

    #[builder(default = None)]
    pub endpoint: Option<String>,

    #[builder(default = None)]
    pub proxy: Option<reqwest::Proxy>,

    #[builder(default = None)]
    pub user_agent: Option<String>,

    #[builder(default = None)]
    pub asset_resolver: Option<Arc<dyn AssetResolver>>,

    #[builder(default = None)]
    pub callback_queue: Option<CallbackQueue>,
}

impl fmt::Debug for ImgurClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgurClientConfig")
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .field("endpoint", &self.endpoint)
            .field("proxy", &self.proxy.is_some())
            .field("user_agent", &self.user_agent)
            .field("asset_resolver", &self.asset_resolver.is_some())
            .field("callback_queue", &self.callback_queue)
            .finish()
    }
}

impl From<ImgurClientConfig> for Result<ImgurClient, UploadError> {
    fn from(config: ImgurClientConfig) -> Self {
        ImgurClient::from_config(config)
    }
}

impl ImgurClient {
    pub fn builder() -> ImgurClientConfigBuilder<((), (), (), (), (), (), ())> {
        ImgurClientConfig::builder()
    }
}

// Helpers to validate URLs supplied as plain strings
impl ImgurClient {
    pub fn create_proxy(url: &str) -> Result<reqwest::Proxy, UploadError> {
        let parsed_url = Url::parse(url)
            .map_err(|e| UploadError::Configuration(format!("Invalid proxy URL: {}", e)))?;

        reqwest::Proxy::all(parsed_url.as_str())
            .map_err(|e| UploadError::Configuration(format!("Invalid proxy configuration: {}", e)))
    }

    pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, UploadError> {
        let url = Url::parse(endpoint)
            .map_err(|e| UploadError::Configuration(format!("Invalid endpoint URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UploadError::Configuration(format!(
                "Endpoint must be http or https: {}",
                endpoint
            )));
        }
        Ok(url)
    }
}
