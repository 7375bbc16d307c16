use std::io::Read;
use std::path::Path;

use futures_util::TryStreamExt;
use log::{debug, info};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

pub const CHUNK_SIZE: usize = 80 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
}

impl DownloadProgress {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.downloaded as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Download failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

impl TransferError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

/// Stream `url` into `dest`, creating missing parent directories.
///
/// Progress is reported after every chunk, but only when the server
/// announced a content length. Returns the number of bytes written.
///
/// # Errors
/// Returns an error when the request fails, the server answers with a
/// non-success status, or the file cannot be written.
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &mpsc::Sender<DownloadProgress>,
) -> Result<u64, TransferError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| TransferError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(TransferError::Status(response.status()));
    }

    let total = response.content_length();

    if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|error| {
            TransferError::io_with_path("failed to create download directory", parent, &error)
        })?;
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        TransferError::io_with_path("failed to create download file", dest, &error)
    })?;

    let mut reader = std::pin::pin!(StreamReader::new(
        response.bytes_stream().map_err(std::io::Error::other)
    ));
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|error| TransferError::io("download stream error", error))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).await.map_err(|error| {
            TransferError::io_with_path("failed to write download data", dest, &error)
        })?;
        downloaded += read as u64;

        if let Some(total) = total {
            let _ = progress.send(DownloadProgress { downloaded, total }).await;
        }
    }

    file.flush().await.map_err(|error| {
        TransferError::io_with_path("failed to flush download file", dest, &error)
    })?;

    info!("Download complete: {downloaded} bytes to {}", dest.display());
    Ok(downloaded)
}

/// Compare the SHA-256 of `path` with a lowercase hex `expected` digest.
///
/// # Errors
/// Returns an error when the file cannot be read or the digest differs.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), TransferError> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        debug!("Checksum verified for {}", path.display());
        Ok(())
    } else {
        Err(TransferError::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected.to_ascii_lowercase(),
            actual,
        })
    }
}

fn sha256_file(path: &Path) -> Result<String, TransferError> {
    let mut file = std::fs::File::open(path).map_err(|error| {
        TransferError::io_with_path("failed to open file for checksum", path, &error)
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = file.read(&mut buffer).map_err(|error| {
            TransferError::io_with_path("failed to read file for checksum", path, &error)
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
