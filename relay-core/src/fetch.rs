use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::Error;

/// Download `url` into `dest_dir/filename`, creating the directory as
/// needed, and return the full local path.
///
/// The body is streamed to disk chunk by chunk; an existing file with the
/// same name is overwritten. No checksum or size validation is performed,
/// and a failed transfer leaves whatever was already written in place.
pub async fn fetch_asset(
    client: &Client,
    url: &str,
    filename: &str,
    dest_dir: &Path,
) -> Result<PathBuf, Error> {
    match fetch_inner(client, url, filename, dest_dir).await {
        Ok(path) => {
            info!(path = %path.display(), "LoRA file downloaded");
            Ok(path)
        }
        Err(e) => {
            error!(url, error = %e, "LoRA download failed");
            Err(e)
        }
    }
}

async fn fetch_inner(
    client: &Client,
    url: &str,
    filename: &str,
    dest_dir: &Path,
) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(dest_dir).await?;
    let dest = dest_dir.join(filename);

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::DownloadStatus {
            url: url.to_string(),
            status,
        });
    }

    let mut file = tokio::fs::File::create(&dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(dest)
}
