// ABOUTME: Imgur SDK library for anonymous image uploads
// ABOUTME: Builds multipart uploads, classifies responses, and delivers results with cancellation

pub mod asset;
pub mod builder;
pub mod constants;
pub mod dispatch;
pub mod error;
mod form;
mod response;
pub mod source;
pub mod task;

#[cfg(test)]
mod test_helpers;

pub use asset::{AssetResolver, DirectoryAssetResolver, ResolvedAsset};
pub use builder::ImgurClientConfig;
pub use dispatch::CallbackQueue;
pub use error::{ErrorCode, UploadError};
pub use image::{DynamicImage, ImageFormat};
pub use source::ImageSource;
pub use task::{UploadHandle, UploadProgress, UploadTask};
pub use url::Url;

use bytes::Bytes;
use futures_util::FutureExt;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, UploadError>;

static SHARED_CLIENT: OnceCell<ImgurClient> = OnceCell::new();

/// One image to upload, with the optional metadata Imgur displays alongside it.
#[derive(Debug)]
pub struct UploadRequest {
    pub source: ImageSource,
    /// Visible on the Imgur website; does not affect the returned URL.
    pub filename: Option<String>,
    pub title: Option<String>,
}

impl UploadRequest {
    pub fn new(source: impl Into<ImageSource>) -> Self {
        Self {
            source: source.into(),
            filename: None,
            title: None,
        }
    }

    pub fn data(data: impl Into<Bytes>) -> Self {
        Self::new(ImageSource::Data(data.into()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(ImageSource::File(path.into()))
    }

    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::new(ImageSource::Stream(Box::new(reader)))
    }

    pub fn image(image: DynamicImage, format: Option<ImageFormat>) -> Self {
        Self::new(ImageSource::Image { image, format })
    }

    pub fn asset(url: Url) -> Self {
        Self::new(ImageSource::Asset(url))
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Anonymously uploads images to Imgur.
///
/// Uploads are authenticated only by the application's client ID, registered at
/// <https://api.imgur.com/oauth2/addclient>. Clones share configuration and the
/// callback queue.
#[derive(Clone)]
pub struct ImgurClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    endpoint: Url,
    client_id: RwLock<SecretString>,
    asset_resolver: Option<Arc<dyn AssetResolver>>,
    callbacks: CallbackQueue,
}

impl ImgurClient {
    pub fn new(client_id: impl Into<String>) -> Result<Self> {
        let client_id: String = client_id.into();
        Self::builder()
            .client_id(SecretString::new(client_id.into_boxed_str()))
            .build()
    }

    /// Create a client using the client ID in `IMGUR_CLIENT_ID`.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var(constants::env::CLIENT_ID).map_err(|_| {
            UploadError::Configuration(format!("{} is not set", constants::env::CLIENT_ID))
        })?;
        Self::new(client_id)
    }

    /// The process-wide client, configured from `IMGUR_CLIENT_ID` on first use.
    ///
    /// Fails, without caching the failure, while the variable is unset. Use
    /// [`ImgurClient::set_client_id`] on the returned handle to change the ID for
    /// every holder of the shared client.
    pub fn shared() -> Result<Self> {
        SHARED_CLIENT.get_or_try_init(Self::from_env).cloned()
    }

    pub fn from_config(config: ImgurClientConfig) -> Result<Self> {
        let endpoint = Self::parse_endpoint(
            config
                .endpoint
                .as_deref()
                .unwrap_or(constants::urls::IMGUR_UPLOAD_ENDPOINT),
        )?;

        let user_agent = config
            .user_agent
            .unwrap_or_else(|| format!("imgur-sdk/{}", env!("CARGO_PKG_VERSION")));

        let mut http_builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout);

        if let Some(proxy) = config.proxy {
            http_builder = http_builder.proxy(proxy);
        }

        let http = http_builder.build().map_err(|e| {
            UploadError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let callbacks = match config.callback_queue {
            Some(queue) => queue,
            None => CallbackQueue::main()?,
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                endpoint,
                client_id: RwLock::new(config.client_id),
                asset_resolver: config.asset_resolver,
                callbacks,
            }),
        })
    }

    pub fn client_id(&self) -> SecretString {
        self.inner.client_id.read().clone()
    }

    /// Replace the client ID. Uploads already in flight keep the old one.
    pub fn set_client_id(&self, client_id: impl Into<String>) {
        let client_id: String = client_id.into();
        *self.inner.client_id.write() = SecretString::new(client_id.into_boxed_str());
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub fn callback_queue(&self) -> &CallbackQueue {
        &self.inner.callbacks
    }

    /// Perform one upload exchange on the current task.
    pub async fn send(&self, request: UploadRequest) -> Result<Url> {
        let (progress, _) = watch::channel(UploadProgress::default());
        self.perform(request, progress).await
    }

    /// Spawn an upload on the tokio runtime and return a task to await it.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn upload(&self, request: UploadRequest) -> UploadTask {
        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(UploadProgress::default());
        let (result_tx, result_rx) = oneshot::channel();

        let client = self.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            let outcome = client.perform_cancellable(request, progress_tx, &token).await;
            let _ = result_tx.send(outcome);
        });

        UploadTask {
            cancel,
            progress: progress_rx,
            result: result_rx,
        }
    }

    /// Spawn an upload and deliver its outcome to `completion` on the callback queue.
    ///
    /// `completion` runs exactly once. If the upload is cancelled before the
    /// callback runs, it receives `UploadError::Cancelled`, never a URL.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn upload_with_completion<F>(&self, request: UploadRequest, completion: F) -> UploadHandle
    where
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(UploadProgress::default());

        let client = self.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            let outcome = client.perform_cancellable(request, progress_tx, &token).await;

            let callbacks = client.inner.callbacks.clone();
            let delivered = callbacks.dispatch(move || {
                let outcome = if token.is_cancelled() {
                    Err(UploadError::Cancelled)
                } else {
                    outcome
                };
                completion(outcome);
            });
            if !delivered {
                log::error!("Callback queue has shut down; upload completion dropped");
            }
        });

        UploadHandle {
            cancel,
            progress: progress_rx,
        }
    }

    /// Upload in-memory image data.
    pub fn upload_image_data<F>(
        &self,
        data: impl Into<Bytes>,
        filename: Option<&str>,
        title: Option<&str>,
        completion: F,
    ) -> UploadHandle
    where
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let request = UploadRequest {
            source: ImageSource::Data(data.into()),
            filename: filename.map(str::to_string),
            title: title.map(str::to_string),
        };
        self.upload_with_completion(request, completion)
    }

    /// Upload an image file. The file's name is sent as the display name.
    pub fn upload_image_file<F>(
        &self,
        path: impl Into<PathBuf>,
        title: Option<&str>,
        completion: F,
    ) -> UploadHandle
    where
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let request = UploadRequest {
            source: ImageSource::File(path.into()),
            filename: None,
            title: title.map(str::to_string),
        };
        self.upload_with_completion(request, completion)
    }

    /// Upload image data read from a stream of unknown length.
    pub fn upload_streamed_image<R, F>(
        &self,
        reader: R,
        filename: Option<&str>,
        title: Option<&str>,
        completion: F,
    ) -> UploadHandle
    where
        R: AsyncRead + Send + Unpin + 'static,
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let request = UploadRequest {
            source: ImageSource::Stream(Box::new(reader)),
            filename: filename.map(str::to_string),
            title: title.map(str::to_string),
        };
        self.upload_with_completion(request, completion)
    }

    /// Encode a decoded image (PNG unless `format` says otherwise) and upload it.
    pub fn upload_image<F>(
        &self,
        image: DynamicImage,
        format: Option<ImageFormat>,
        filename: Option<&str>,
        title: Option<&str>,
        completion: F,
    ) -> UploadHandle
    where
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let request = UploadRequest {
            source: ImageSource::Image { image, format },
            filename: filename.map(str::to_string),
            title: title.map(str::to_string),
        };
        self.upload_with_completion(request, completion)
    }

    /// Resolve an asset reference through the configured resolver and upload it.
    pub fn upload_asset<F>(&self, asset_url: Url, title: Option<&str>, completion: F) -> UploadHandle
    where
        F: FnOnce(Result<Url>) + Send + 'static,
    {
        let request = UploadRequest {
            source: ImageSource::Asset(asset_url),
            filename: None,
            title: title.map(str::to_string),
        };
        self.upload_with_completion(request, completion)
    }

    async fn perform_cancellable(
        &self,
        request: UploadRequest,
        progress: watch::Sender<UploadProgress>,
        cancel: &CancellationToken,
    ) -> Result<Url> {
        let exchange = AssertUnwindSafe(self.perform(request, progress)).catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            caught = exchange => caught.unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                log::error!("Upload worker panicked: {}", message);
                Err(UploadError::Internal(message))
            }),
        };

        match outcome {
            Ok(_) if cancel.is_cancelled() => Err(UploadError::Cancelled),
            Err(UploadError::Cancelled) => {
                log::debug!("Upload cancelled");
                Err(UploadError::Cancelled)
            }
            other => other,
        }
    }

    async fn perform(
        &self,
        request: UploadRequest,
        progress: watch::Sender<UploadProgress>,
    ) -> Result<Url> {
        let authorization = self.authorization_header()?;

        let image = request
            .source
            .prepare(request.filename, self.inner.asset_resolver.as_deref())
            .await?;

        log::debug!(
            "Uploading {} ({}) to {}",
            image.filename,
            image.content_type,
            self.inner.endpoint
        );

        let form = form::build_form(image, request.title, progress)?;

        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .header(AUTHORIZATION, authorization)
            .multipart(form)
            .send()
            .await?;

        let outcome = response::parse_response(response).await;
        match &outcome {
            Ok(url) => log::debug!("Upload finished: {}", url),
            Err(err) => log::debug!("Upload failed ({}): {}", err.code(), err),
        }
        outcome
    }

    /// Snapshot the client ID for one request.
    fn authorization_header(&self) -> Result<HeaderValue> {
        let client_id = self.inner.client_id.read();
        let client_id = client_id.expose_secret().trim();

        if client_id.is_empty() {
            return Err(UploadError::Configuration(
                "Imgur client ID is empty".to_string(),
            ));
        }

        let mut value = HeaderValue::from_str(&format!("Client-ID {}", client_id)).map_err(|_| {
            UploadError::Configuration("Imgur client ID contains invalid characters".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
