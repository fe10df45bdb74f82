// src/fetch/http.rs
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Optional HTTP basic credentials for a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

fn request(client: &Client, url: &Url, auth: Option<&BasicAuth>) -> RequestBuilder {
    let req = client.get(url.clone());
    match auth {
        Some(a) => req.basic_auth(&a.username, Some(&a.password)),
        None => req,
    }
}

async fn get_bytes_core(client: &Client, url: &Url, auth: Option<&BasicAuth>) -> Result<Vec<u8>> {
    debug!("Fetching bytes from {}", url);
    let bytes = request(client, url, auth)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .bytes()
        .await
        .with_context(|| format!("Reading body from {}", url))?;
    Ok(bytes.to_vec())
}

/// GET `url`, retrying with exponential backoff. The last error is returned
/// once `max_retries` extra attempts are used up.
pub async fn get_bytes_with_retry(
    client: &Client,
    url: &Url,
    auth: Option<&BasicAuth>,
    max_retries: u32,
    initial_backoff_ms: u64,
) -> Result<Vec<u8>> {
    let mut attempts = 0;
    loop {
        match get_bytes_core(client, url, auth).await {
            Ok(b) => return Ok(b),
            Err(e) if attempts < max_retries => {
                attempts += 1;
                let backoff = initial_backoff_ms * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_fails_after_retries() {
        let client = Client::new();
        // port 9 on localhost: nothing listens, connection is refused
        let url = Url::parse("http://127.0.0.1:9/none.csv").unwrap();
        let res = get_bytes_with_retry(&client, &url, None, 1, 1).await;
        assert!(res.is_err());
    }
}
