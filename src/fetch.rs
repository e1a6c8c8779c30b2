use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use log::warn;
use reqwest::blocking::Client;

const TIMEOUT_SECS: u64 = 30;
const RETRIES: u32 = 2;
const RETRY_DELAY_SECS: u64 = 2;

/// Single-method capability the collector depends on. Swappable with an
/// in-memory stub in tests.
pub trait DocumentFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let mut last_err = anyhow!("no attempt made for {url}");
        for attempt in 0..=RETRIES {
            if attempt > 0 {
                thread::sleep(Duration::from_secs(RETRY_DELAY_SECS));
            }
            match self.client.get(url).send() {
                Ok(resp) => match resp.error_for_status() {
                    // text() honors the charset declared by the server
                    // (the source pages serve ISO-8859-1).
                    Ok(resp) => return resp.text().context("failed to read response body"),
                    Err(e) => last_err = anyhow::Error::new(e),
                },
                Err(e) => last_err = anyhow::Error::new(e),
            }
            warn!("fetch attempt {} failed for {}", attempt + 1, url);
        }
        Err(last_err.context(format!("failed to fetch {url}")))
    }
}
