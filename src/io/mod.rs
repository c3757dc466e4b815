mod http;
mod local;

pub use http::HttpSource;
pub use local::LocalSource;

use anyhow::Result;
use async_trait::async_trait;

/// Somewhere a pack's bytes can be loaded from
#[async_trait]
pub trait PackSource: Send + Sync {
    /// File name of the pack, used to detect its format
    fn name(&self) -> &str;

    /// Read the whole pack into memory
    async fn load(&self) -> Result<Vec<u8>>;
}

/// Returns true if `input` should be fetched over HTTP rather than read from disk
pub fn is_http_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Pick the source for a command-line input
pub fn open(input: &str) -> Result<Box<dyn PackSource>> {
    if is_http_url(input) {
        Ok(Box::new(HttpSource::new(input)?))
    } else {
        Ok(Box::new(LocalSource::new(input)?))
    }
}
