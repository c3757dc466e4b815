use super::PackSource;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Pack read from the local filesystem
pub struct LocalSource {
    path: PathBuf,
    name: String,
}

impl LocalSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("'{}' does not name a file", path.display()))?
            .to_string();
        Ok(Self { path, name })
    }
}

#[async_trait]
impl PackSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("cannot read {}", self.path.display()))
    }
}
