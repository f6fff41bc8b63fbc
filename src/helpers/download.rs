use std::{path::Path, time::Duration};

use reqwest::{header, Client, Response};
use tokio::{
    fs,
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, trace};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Plain HTTP GET access, kept behind a trait so the scrape pipeline can be
/// driven without a network.
#[async_trait::async_trait]
pub trait HttpFetch: std::fmt::Debug + Send + Sync {
    /// Fetch a page body, giving up after `timeout`.
    async fn fetch_text(&self, url: &str, timeout: Duration) -> anyhow::Result<String>;

    /// Stream `url` into `file_path`. No timeout is applied.
    async fn download_file(&self, url: &str, file_path: &Path) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}
impl ReqwestFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpFetch for ReqwestFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch_text(&self, url: &str, timeout: Duration) -> anyhow::Result<String> {
        debug!("Fetching page");
        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        resp.text().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    async fn download_file(&self, url: &str, file_path: &Path) -> anyhow::Result<u64> {
        debug!("Starting download");
        let resp = self.client.get(url).send().await?.error_for_status()?;

        write_resp_to_file(resp, file_path).await
    }
}

async fn write_resp_to_file(mut resp: Response, file_path: &Path) -> anyhow::Result<u64> {
    trace!(path = ?file_path, "Writing request response to disk");

    let mut written = 0_u64;
    let out_file = fs::File::create(file_path).await?;
    let mut out_file = BufWriter::new(out_file);

    while let Some(chunk) = resp.chunk().await? {
        out_file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out_file.flush().await?;

    debug!(bytes = written, "Response written to disk");

    Ok(written)
}
