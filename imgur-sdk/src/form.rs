// ABOUTME: Multipart form construction for the anonymous upload endpoint
// ABOUTME: Streams the image part in chunks and reports bytes handed to the transport

use crate::constants::upload;
use crate::error::UploadError;
use crate::source::{ImageBody, PreparedImage};
use crate::task::UploadProgress;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;

pub(crate) fn build_form(
    image: PreparedImage,
    title: Option<String>,
    progress: watch::Sender<UploadProgress>,
) -> Result<Form, UploadError> {
    let (chunks, length) = body_stream(image.body);

    if let Some(length) = length {
        if length > upload::MAX_FILE_SIZE {
            log::warn!(
                "Image is {} bytes; Imgur may reject files over {} bytes",
                length,
                upload::MAX_FILE_SIZE
            );
        }
    }

    progress.send_modify(|p| {
        p.completed = 0;
        p.total = length;
    });

    let counted = chunks.inspect_ok(move |chunk| {
        progress.send_modify(|p| p.completed += chunk.len() as u64);
    });
    let body = Body::wrap_stream(counted);

    let part = match length {
        Some(length) => Part::stream_with_length(body, length),
        None => Part::stream(body),
    }
    .file_name(image.filename)
    .mime_str(&image.content_type)
    .map_err(|e| {
        UploadError::Configuration(format!(
            "Invalid content type '{}': {}",
            image.content_type, e
        ))
    })?;

    let mut form = Form::new()
        .part(upload::FIELD_IMAGE, part)
        .text(upload::FIELD_TYPE, upload::TYPE_FILE);

    if let Some(title) = title {
        form = form.text(upload::FIELD_TITLE, title);
    }
    if let Some(name) = image.display_name {
        form = form.text(upload::FIELD_NAME, name);
    }

    Ok(form)
}

fn body_stream(body: ImageBody) -> (BoxStream<'static, std::io::Result<Bytes>>, Option<u64>) {
    match body {
        ImageBody::Bytes(data) => {
            let length = data.len() as u64;
            let chunks = split_chunks(data, upload::CHUNK_SIZE);
            (stream::iter(chunks.into_iter().map(Ok)).boxed(), Some(length))
        }
        ImageBody::Reader { reader, length } => (
            ReaderStream::with_capacity(reader, upload::CHUNK_SIZE).boxed(),
            length,
        ),
    }
}

fn split_chunks(mut data: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
    while data.len() > chunk_size {
        chunks.push(data.split_to(chunk_size));
    }
    if !data.is_empty() {
        chunks.push(data);
    }
    chunks
}
