//! Local filesystem storage implementation.
//!
//! Both tables are CSV files with a header row. Link rows are appended in
//! place; the detail table is written to a temporary file and renamed over
//! the previous one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{DETAIL_COLUMNS, DetailRecord, LINK_COLUMNS, LinkRecord, PathsConfig};
use crate::storage::RecordStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    links_path: PathBuf,
    details_path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage with both tables under `root_dir`.
    pub fn new(root_dir: impl AsRef<Path>, paths: &PathsConfig) -> Self {
        let root_dir = root_dir.as_ref();
        Self {
            links_path: root_dir.join(&paths.links_file),
            details_path: root_dir.join(&paths.details_file),
        }
    }

    /// Override the link table location.
    pub fn with_links_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.links_path = path.into();
        self
    }

    /// Override the detail table location.
    pub fn with_details_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.details_path = path.into();
        self
    }

    pub fn links_path(&self) -> &Path {
        &self.links_path
    }

    pub fn details_path(&self) -> &Path {
        &self.details_path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Append bytes, creating the file if needed.
    async fn append_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read bytes, reporting a missing file as [`AppError::MissingInput`].
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::MissingInput(path.to_path_buf()))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn table_is_empty(&self, path: &Path) -> Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Encode rows as CSV, optionally preceded by `header`.
fn encode_rows<T: Serialize>(header: Option<&[&str]>, rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Decode CSV rows, matching columns by header name.
fn decode_rows<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

#[async_trait]
impl RecordStorage for LocalStorage {
    async fn init_links(&self) -> Result<()> {
        if self.table_is_empty(&self.links_path).await? {
            let header = encode_rows::<LinkRecord>(Some(&LINK_COLUMNS[..]), &[])?;
            self.append_bytes(&self.links_path, &header).await?;
            log::info!("Created link table {}", self.links_path.display());
        }
        Ok(())
    }

    async fn append_links(&self, links: &[LinkRecord]) -> Result<()> {
        let header: Option<&[&str]> = if self.table_is_empty(&self.links_path).await? {
            Some(&LINK_COLUMNS[..])
        } else {
            None
        };
        let bytes = encode_rows(header, links)?;
        self.append_bytes(&self.links_path, &bytes).await
    }

    async fn load_links(&self) -> Result<Vec<LinkRecord>> {
        let bytes = self.read_bytes(&self.links_path).await?;
        decode_rows(&bytes)
    }

    async fn write_details(&self, records: &[DetailRecord]) -> Result<()> {
        let bytes = encode_rows(Some(&DETAIL_COLUMNS[..]), records)?;
        self.write_bytes(&self.details_path, &bytes).await
    }

    async fn load_details(&self) -> Result<Vec<DetailRecord>> {
        let bytes = self.read_bytes(&self.details_path).await?;
        decode_rows(&bytes)
    }
}
