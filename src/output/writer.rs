//! Collision-free tag file writer

use crate::crawler::ExtractionResult;
use crate::WriteError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

/// Extension given to every tag file
pub const TAG_FILE_EXTENSION: &str = "txt";

/// Writes each extraction result to a brand-new file in one directory
///
/// The directory must already exist; it is never created here.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    directory: PathBuf,
}

impl OutputWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes the tags as one `", "`-joined line to `<uuid>.txt`
    pub async fn write(&self, result: &ExtractionResult) -> Result<PathBuf, WriteError> {
        write_tags(&self.directory, result).await
    }
}

/// Writes the tags as one `", "`-joined line to a new `<uuid>.txt` in `directory`
///
/// The file is opened with `create_new`, so an existing file is never touched;
/// a name collision surfaces as an `AlreadyExists` error instead of data loss.
/// If writing fails after the file was created, the file is removed again
/// (best effort) so no empty or partial tag file is left behind.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the file that was written
/// * `Err(WriteError)` - The file could not be created or written
pub async fn write_tags(directory: &Path, result: &ExtractionResult) -> Result<PathBuf, WriteError> {
    let path = directory.join(format!("{}.{}", Uuid::new_v4(), TAG_FILE_EXTENSION));
    let io_error = |source| WriteError::Io {
        path: path.clone(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(io_error)?;

    write_or_discard(file, &path, result.joined().as_bytes())
        .await
        .map_err(io_error)?;

    tracing::debug!(
        "Wrote {} tags from {} to {}",
        result.tags.len(),
        result.source_url,
        path.display()
    );

    Ok(path)
}

/// Writes `contents` to the freshly created file at `path`, removing it on failure
async fn write_or_discard<W>(mut file: W, path: &Path, contents: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(contents).await?;
        file.flush().await
    }
    .await;

    if written.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove partial tag file {}: {}", path.display(), e);
        }
    }

    written
}
