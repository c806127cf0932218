//! File-backed refresher.
//!
//! Loads a JSON or YAML document from disk on every refresh. The format is
//! picked by extension: `.yaml`/`.yml` are YAML, everything else is JSON.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::refresh::Refresher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Refresher producing a [`Value`] snapshot from a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = Format::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Parses raw document bytes in this source's format.
    pub fn parse(&self, data: &[u8]) -> Result<Value> {
        match self.format {
            Format::Json => serde_json::from_slice(data)
                .with_context(|| format!("unmarshal json from {:?}", self.path)),
            Format::Yaml => serde_yaml::from_slice(data)
                .with_context(|| format!("unmarshal yaml from {:?}", self.path)),
        }
    }
}

#[async_trait]
impl Refresher<Value> for FileSource {
    async fn refresh(&self) -> Result<Value> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("read source file {:?}", self.path))?;
        self.parse(&data)
    }
}
