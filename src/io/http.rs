use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use super::PackSource;
use anyhow::{Result, anyhow, bail};
use log::warn;

/// Pack downloaded over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: Url,
    name: String,
    max_retry: u32,
}

impl HttpSource {
    /// Create a source for `url`
    ///
    /// The pack's file name is the last segment of the URL path
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        let name = file_name(&url)?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            url,
            name,
            max_retry: 10,
        })
    }
}

fn file_name(url: &Url) -> Result<String> {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("URL {url} does not end in a file name"))
}

#[async_trait]
impl PackSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<u8>> {
        let mut retry_count = 0;

        loop {
            match self.client.get(self.url.clone()).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }
                    return Ok(resp.bytes().await?.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
