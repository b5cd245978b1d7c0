// ABOUTME: Asset reference resolution for uploads that name an image by URL
// ABOUTME: Defines the AssetResolver seam and a directory-backed implementation

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Image bytes an asset reference resolved to.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub data: Bytes,
    pub filename: Option<String>,
}

/// Resolves asset references (for example `asset://albums/cat.jpg`) to image data.
///
/// Returning `Ok(None)` means the asset exists in no form the resolver knows about;
/// uploads treat that the same as a missing image.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, url: &Url) -> anyhow::Result<Option<ResolvedAsset>>;
}

/// Resolves `asset://` URLs to files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryAssetResolver {
    root: PathBuf,
}

impl DirectoryAssetResolver {
    pub const SCHEME: &'static str = "asset";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an asset URL onto a path under the root, rejecting anything that escapes it.
    fn path_for(&self, url: &Url) -> Option<PathBuf> {
        if url.scheme() != Self::SCHEME {
            return None;
        }

        let mut relative = PathBuf::new();
        let segments = url
            .host_str()
            .into_iter()
            .chain(url.path_segments()?)
            .filter(|s| !s.is_empty());
        for segment in segments {
            let decoded = urlencoding::decode(segment).ok()?;
            // An encoded separator must not smuggle extra components in.
            if decoded.contains(['/', '\\']) {
                log::warn!("Refusing asset path with encoded separator: {}", url);
                return None;
            }
            relative.push(decoded.as_ref());
        }

        if relative.as_os_str().is_empty() {
            return None;
        }
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            log::warn!("Refusing asset path outside the asset root: {}", url);
            return None;
        }

        Some(self.root.join(relative))
    }
}

#[async_trait]
impl AssetResolver for DirectoryAssetResolver {
    async fn resolve(&self, url: &Url) -> anyhow::Result<Option<ResolvedAsset>> {
        let Some(path) = self.path_for(url) else {
            return Ok(None);
        };

        log::debug!("Resolving asset {} to {}", url, path.display());

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(ResolvedAsset {
                data: Bytes::from(data),
                filename: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
            })),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
