use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::MallError;

/// 재시도 초기 대기 시간
const INITIAL_BACKOFF_MS: u64 = 1000;
/// 재시도 대기 상한
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// initial * 2^attempt, MAX_BACKOFF 에서 멈춘다
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    initial
        .checked_mul(factor)
        .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

/// URL → HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn initialize(&mut self) -> Result<(), MallError> {
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<String, MallError>;

    async fn close(&mut self) -> Result<(), MallError> {
        Ok(())
    }
}

/// 정적 HTML 용 (reqwest)
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, MallError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| MallError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String, MallError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MallError::http(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MallError::Http {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        // Content-Type 의 charset 을 보고 디코딩한다 (EUC-KR 몰 대응)
        response.text().await.map_err(|e| MallError::http(url, e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, MallError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries => {
                    let backoff = backoff_delay(self.initial_backoff, attempt);
                    warn!(
                        "Fetch attempt {} failed, retrying in {:?}: {}",
                        attempt + 1,
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| MallError::Http {
            url: url.to_string(),
            status: None,
            message: "max retries exceeded".to_string(),
        }))
    }

    async fn close(&mut self) -> Result<(), MallError> {
        info!("HTTP fetcher closed");
        Ok(())
    }
}
