// ABOUTME: Image input forms accepted by the uploader and their normalization
// ABOUTME: Turns bytes, files, streams, decoded images, and asset URLs into an upload body

use crate::asset::AssetResolver;
use crate::constants::upload;
use crate::error::UploadError;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;
use url::Url;

/// Where the image for an upload comes from.
pub enum ImageSource {
    /// Encoded image data already in memory.
    Data(Bytes),
    /// An encoded image file on disk.
    File(PathBuf),
    /// Encoded image data read incrementally; the length is not known up front.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
    /// A decoded image, encoded to `format` (PNG when `None`) before upload.
    Image {
        image: DynamicImage,
        format: Option<ImageFormat>,
    },
    /// A reference resolved through the client's `AssetResolver`.
    Asset(Url),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Data(data) => f.debug_tuple("Data").field(&data.len()).finish(),
            ImageSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ImageSource::Stream(_) => f.write_str("Stream(..)"),
            ImageSource::Image { image, format } => f
                .debug_struct("Image")
                .field("width", &image.width())
                .field("height", &image.height())
                .field("format", format)
                .finish(),
            ImageSource::Asset(url) => f.debug_tuple("Asset").field(&url.as_str()).finish(),
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        ImageSource::Data(Bytes::from(data))
    }
}

impl From<Bytes> for ImageSource {
    fn from(data: Bytes) -> Self {
        ImageSource::Data(data)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Image {
            image,
            format: None,
        }
    }
}

/// Body of the multipart image part.
pub(crate) enum ImageBody {
    Bytes(Bytes),
    Reader {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        length: Option<u64>,
    },
}

/// An image ready to be placed into the upload form.
pub(crate) struct PreparedImage {
    pub body: ImageBody,
    /// Filename on the multipart part; always present.
    pub filename: String,
    /// Filename the caller supplied or the source implied, sent as the display name.
    pub display_name: Option<String>,
    pub content_type: String,
}

impl ImageSource {
    /// Read, encode, or resolve the source into an upload body.
    ///
    /// Fails with `MissingImage` when there is nothing to upload.
    pub(crate) async fn prepare(
        self,
        filename: Option<String>,
        resolver: Option<&dyn AssetResolver>,
    ) -> Result<PreparedImage, UploadError> {
        match self {
            ImageSource::Data(data) => prepare_data(data, filename),
            ImageSource::File(path) => prepare_file(&path, filename).await,
            ImageSource::Stream(reader) => Ok(PreparedImage {
                content_type: content_type_for(filename.as_deref()),
                filename: filename
                    .clone()
                    .unwrap_or_else(|| upload::DEFAULT_FILENAME_STEM.to_string()),
                display_name: filename,
                body: ImageBody::Reader {
                    reader,
                    length: None,
                },
            }),
            ImageSource::Image { image, format } => {
                let format = format.unwrap_or(ImageFormat::Png);
                let data = encode_image(&image, format)?;
                let filename = filename_with_extension(filename, format);
                Ok(PreparedImage {
                    body: ImageBody::Bytes(data),
                    content_type: format.to_mime_type().to_string(),
                    display_name: Some(filename.clone()),
                    filename,
                })
            }
            ImageSource::Asset(url) => {
                let Some(resolver) = resolver else {
                    return Err(UploadError::missing_image(format!(
                        "no asset resolver configured for {}",
                        url
                    )));
                };

                let asset = resolver
                    .resolve(&url)
                    .await
                    .map_err(|err| UploadError::MissingImage {
                        description: format!("failed to resolve asset {}", url).into(),
                        source: Some(err.into()),
                    })?
                    .ok_or_else(|| {
                        UploadError::missing_image(format!("asset {} has no image", url))
                    })?;

                prepare_data(asset.data, filename.or(asset.filename))
            }
        }
    }
}

fn prepare_data(data: Bytes, filename: Option<String>) -> Result<PreparedImage, UploadError> {
    if data.is_empty() {
        return Err(UploadError::missing_image("image data is empty"));
    }

    let guessed = image::guess_format(&data).ok();
    let content_type = match (&filename, guessed) {
        (Some(name), _) => content_type_for(Some(name)),
        (None, Some(format)) => format.to_mime_type().to_string(),
        (None, None) => upload::FALLBACK_CONTENT_TYPE.to_string(),
    };
    let part_filename = match (&filename, guessed) {
        (Some(name), _) => name.clone(),
        (None, Some(format)) => filename_with_extension(None, format),
        (None, None) => upload::DEFAULT_FILENAME_STEM.to_string(),
    };

    Ok(PreparedImage {
        body: ImageBody::Bytes(data),
        filename: part_filename,
        display_name: filename,
        content_type,
    })
}

async fn prepare_file(path: &Path, filename: Option<String>) -> Result<PreparedImage, UploadError> {
    let file = tokio::fs::File::open(path).await.map_err(|err| {
        UploadError::MissingImage {
            description: format!("could not open {}", path.display()).into(),
            source: Some(Box::new(err)),
        }
    })?;
    let metadata = file.metadata().await?;

    if !metadata.is_file() {
        return Err(UploadError::missing_image(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(UploadError::missing_image(format!(
            "{} is empty",
            path.display()
        )));
    }

    let filename = filename.or_else(|| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });

    Ok(PreparedImage {
        content_type: content_type_for(filename.as_deref()),
        filename: filename
            .clone()
            .unwrap_or_else(|| upload::DEFAULT_FILENAME_STEM.to_string()),
        display_name: filename,
        body: ImageBody::Reader {
            reader: Box::new(file),
            length: Some(metadata.len()),
        },
    })
}

fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Bytes, UploadError> {
    let mut buffer = Cursor::new(Vec::new());

    // JPEG has no alpha channel
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, format)?;
    } else {
        image.write_to(&mut buffer, format)?;
    }

    log::debug!(
        "Encoded {}x{} image as {:?} ({} bytes)",
        image.width(),
        image.height(),
        format,
        buffer.get_ref().len()
    );

    Ok(Bytes::from(buffer.into_inner()))
}

/// Append the format's preferred extension when the name has none.
fn filename_with_extension(filename: Option<String>, format: ImageFormat) -> String {
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    match filename {
        Some(name) if Path::new(&name).extension().is_some() => name,
        Some(name) => format!("{}.{}", name, extension),
        None => format!("{}.{}", upload::DEFAULT_FILENAME_STEM, extension),
    }
}

fn content_type_for(filename: Option<&str>) -> String {
    filename
        .and_then(|name| mime_guess::from_path(name).first())
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| upload::FALLBACK_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::DirectoryAssetResolver;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(2, 2)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_empty_data_is_missing_image() {
        let result = ImageSource::Data(Bytes::new()).prepare(None, None).await;
        assert!(matches!(result, Err(UploadError::MissingImage { .. })));
    }

    #[tokio::test]
    async fn test_data_without_filename_guesses_format() {
        let prepared = ImageSource::from(png_bytes())
            .prepare(None, None)
            .await
            .unwrap();

        assert_eq!(prepared.filename, "image.png");
        assert_eq!(prepared.content_type, "image/png");
        assert_eq!(prepared.display_name, None);
    }

    #[tokio::test]
    async fn test_data_with_unknown_format_falls_back() {
        let prepared = ImageSource::from(b"not an image".to_vec())
            .prepare(None, None)
            .await
            .unwrap();

        assert_eq!(prepared.filename, "image");
        assert_eq!(prepared.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_data_keeps_caller_filename() {
        let prepared = ImageSource::from(b"bytes".to_vec())
            .prepare(Some("holiday.jpg".to_string()), None)
            .await
            .unwrap();

        assert_eq!(prepared.filename, "holiday.jpg");
        assert_eq!(prepared.display_name.as_deref(), Some("holiday.jpg"));
        assert_eq!(prepared.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_file_is_missing_image() {
        let result = ImageSource::File(PathBuf::from("/definitely/not/here.png"))
            .prepare(None, None)
            .await;
        assert!(matches!(result, Err(UploadError::MissingImage { .. })));
    }

    #[tokio::test]
    async fn test_file_uses_its_name_and_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sunset.gif");
        std::fs::write(&path, b"GIF89a-ish").unwrap();

        let prepared = ImageSource::File(path).prepare(None, None).await.unwrap();

        assert_eq!(prepared.filename, "sunset.gif");
        assert_eq!(prepared.content_type, "image/gif");
        match prepared.body {
            ImageBody::Reader { length, .. } => assert_eq!(length, Some(10)),
            ImageBody::Bytes(_) => panic!("Expected a streamed file body"),
        }
    }

    #[tokio::test]
    async fn test_directory_is_missing_image() {
        let dir = TempDir::new().unwrap();
        let result = ImageSource::File(dir.path().to_path_buf())
            .prepare(None, None)
            .await;
        assert!(matches!(result, Err(UploadError::MissingImage { .. })));
    }

    #[tokio::test]
    async fn test_image_defaults_to_png() {
        let source = ImageSource::from(DynamicImage::new_rgba8(3, 3));
        let prepared = source.prepare(Some("shot".to_string()), None).await.unwrap();

        assert_eq!(prepared.filename, "shot.png");
        assert_eq!(prepared.content_type, "image/png");
        match prepared.body {
            ImageBody::Bytes(data) => {
                assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Png)
            }
            ImageBody::Reader { .. } => panic!("Expected encoded bytes"),
        }
    }

    #[tokio::test]
    async fn test_image_jpeg_drops_alpha() {
        let source = ImageSource::Image {
            image: DynamicImage::new_rgba8(4, 4),
            format: Some(ImageFormat::Jpeg),
        };
        let prepared = source.prepare(None, None).await.unwrap();

        assert_eq!(prepared.filename, "image.jpg");
        assert_eq!(prepared.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_asset_without_resolver_is_missing_image() {
        let url = Url::parse("asset://cat.png").unwrap();
        let result = ImageSource::Asset(url).prepare(None, None).await;
        assert!(matches!(result, Err(UploadError::MissingImage { .. })));
    }

    #[tokio::test]
    async fn test_asset_resolves_through_resolver() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cat.png"), png_bytes()).unwrap();
        let resolver = DirectoryAssetResolver::new(dir.path());

        let url = Url::parse("asset://cat.png").unwrap();
        let prepared = ImageSource::Asset(url)
            .prepare(None, Some(&resolver))
            .await
            .unwrap();

        assert_eq!(prepared.filename, "cat.png");
        assert_eq!(prepared.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_unresolvable_asset_is_missing_image() {
        let dir = TempDir::new().unwrap();
        let resolver = DirectoryAssetResolver::new(dir.path());

        let url = Url::parse("asset://ghost.png").unwrap();
        let result = ImageSource::Asset(url).prepare(None, Some(&resolver)).await;
        assert!(matches!(result, Err(UploadError::MissingImage { .. })));
    }

    #[test]
    fn test_filename_with_extension() {
        assert_eq!(
            filename_with_extension(Some("a.webp".to_string()), ImageFormat::Png),
            "a.webp"
        );
        assert_eq!(
            filename_with_extension(Some("a".to_string()), ImageFormat::Gif),
            "a.gif"
        );
        assert_eq!(filename_with_extension(None, ImageFormat::Png), "image.png");
    }
}
