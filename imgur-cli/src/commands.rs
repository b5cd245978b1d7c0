// ABOUTME: Command execution for the imgur binary: builds the SDK client and runs uploads
// ABOUTME: Wires Ctrl-C cancellation, progress rendering, and text or JSON result output

use crate::cli::{Cli, Commands, OutputArgs, UploadFormat};
use crate::cli_output::{CliOutput, UploadReport};
use crate::completions::CompletionGenerator;
use crate::config::Config;
use crate::constants::env;
use crate::progress::{format_bytes, UploadBar};
use anyhow::{anyhow, Context, Result};
use clap::CommandFactory;
use imgur_sdk::constants::upload;
use imgur_sdk::{
    AssetResolver, DirectoryAssetResolver, ImgurClient, UploadError, UploadRequest, Url,
};
use secrecy::SecretString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Path argument meaning "read the image from standard input"
pub const STDIN_PATH: &str = "-";

/// Build an SDK client from the merged configuration
pub fn build_client(
    config: &Config,
    client_id: String,
    asset_dir: Option<PathBuf>,
) -> Result<ImgurClient> {
    let asset_root = match asset_dir.or_else(|| config.asset_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let resolver: Arc<dyn AssetResolver> = Arc::new(DirectoryAssetResolver::new(asset_root));

    let builder = ImgurClient::builder()
        .client_id(SecretString::new(client_id.into_boxed_str()))
        .endpoint(config.endpoint.clone())
        .user_agent(Some(format!("imgur-cli/{}", env!("CARGO_PKG_VERSION"))))
        .asset_resolver(Some(resolver));

    let client = match config.timeout() {
        Some(timeout) => builder.timeout(timeout).build(),
        None => builder.build(),
    }?;

    log::debug!("Uploading to {}", client.endpoint());
    Ok(client)
}

/// Request for a path argument, where "-" reads standard input
pub fn request_for_path(path: &str, name: Option<String>) -> UploadRequest {
    let request = if path == STDIN_PATH {
        UploadRequest::stream(tokio::io::stdin())
    } else {
        UploadRequest::file(path)
    };

    match name {
        Some(name) => request.with_filename(name),
        None => request,
    }
}

/// Decode `path` off the async runtime and queue it for re-encoding as `format`
pub async fn convert_request(path: &Path, format: UploadFormat) -> Result<UploadRequest> {
    let owned = path.to_path_buf();
    let image = tokio::task::spawn_blocking(move || image::open(&owned))
        .await
        .context("Image decoder panicked")?
        .map_err(UploadError::from)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(upload::DEFAULT_FILENAME_STEM)
        .to_string();

    Ok(UploadRequest::image(image, Some(format.into())).with_filename(stem))
}

/// Run one upload to completion, cancelling it on Ctrl-C
pub async fn run_upload(
    client: &ImgurClient,
    request: UploadRequest,
    label: &str,
    show_progress: bool,
) -> Result<Url, UploadError> {
    let task = client.upload(request);

    let handle = task.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("Interrupt received, cancelling upload");
            handle.cancel();
        }
    });

    let bar = if show_progress {
        UploadBar::new(label)
    } else {
        UploadBar::hidden()
    };
    let (done_tx, done_rx) = oneshot::channel();
    let follower = tokio::spawn(bar.follow(task.progress(), done_rx));

    let outcome = task.await;
    interrupt.abort();
    let _ = done_tx.send(());

    if let Ok(bar) = follower.await {
        log::debug!("Sent {} for {}", bar.summary(), label);
        match &outcome {
            Ok(_) => bar.finish("Uploaded"),
            Err(_) => bar.abandon(),
        }
    }

    outcome
}

/// Warning text when the file at `path` is larger than Imgur accepts
pub fn size_warning(path: &Path) -> Option<String> {
    let length = std::fs::metadata(path).ok()?.len();
    (length > upload::MAX_FILE_SIZE).then(|| {
        format!(
            "{} is {}; Imgur may reject files over {}",
            path.display(),
            format_bytes(length),
            format_bytes(upload::MAX_FILE_SIZE)
        )
    })
}

/// Execute a parsed command line; returns the report for upload commands
pub async fn execute(cli: Cli, config: Config, out: &CliOutput) -> Result<Option<UploadReport>> {
    let client_id_flag = cli.client_id;

    let (request, label, title, output, asset_dir) = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            CompletionGenerator::new().generate(shell, &mut cmd, &mut std::io::stdout())?;
            if std::io::stdout().is_terminal() {
                eprintln!("{}", CompletionGenerator::installation_instructions());
            }
            return Ok(None);
        }
        Commands::Upload {
            path,
            title,
            name,
            output,
        } => {
            if path != STDIN_PATH {
                if let Some(warning) = size_warning(Path::new(&path)) {
                    out.warning(&warning);
                }
            }
            let request = request_for_path(&path, name);
            (request, path, title, output, None)
        }
        Commands::ConvertUpload {
            path,
            format,
            title,
            output,
        } => {
            let request = convert_request(&path, format).await?;
            (request, path.display().to_string(), title, output, None)
        }
        Commands::Asset {
            url,
            asset_dir,
            title,
            output,
        } => {
            let asset_url =
                Url::parse(&url).with_context(|| format!("Invalid asset reference: {}", url))?;
            (UploadRequest::asset(asset_url), url, title, output, asset_dir)
        }
    };

    let client_id = config
        .resolve_client_id(client_id_flag.as_deref())
        .ok_or_else(|| {
            anyhow!(
                "No Imgur client ID found. Pass --client-id or set {}",
                imgur_sdk::constants::env::CLIENT_ID
            )
        })?;
    let client = build_client(&config, client_id, asset_dir)?;

    let title = title.or_else(|| config.default_title.clone());
    let request = match title.clone() {
        Some(title) => request.with_title(title),
        None => request,
    };

    let json = output.json || config.wants_json();
    let link = run_upload(&client, request, &label, show_progress(&output, json)).await?;

    let report = UploadReport::new(&link, title.as_deref(), label);
    if json {
        println!("{}", report.to_json(output.pretty)?);
    } else {
        out.link(&link);
    }

    Ok(Some(report))
}

fn show_progress(output: &OutputArgs, json: bool) -> bool {
    !output.no_progress
        && !json
        && std::env::var_os(env::QUIET).is_none()
        && std::io::stderr().is_terminal()
}
