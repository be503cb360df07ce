//! 자바스크립트로 목록을 그리는 몰용 headless Chrome 페처

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, BrowserConfigBuilder};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::fetcher::PageFetcher;
use crate::config::ScraperConfig;
use crate::error::MallError;

/// 페이지 안정 대기 타임아웃 (밀리초)
const PAGE_STABLE_TIMEOUT_MS: u64 = 10000;
const PAGE_STABLE_CHECK_INTERVAL_MS: u64 = 300;
/// 연속으로 HTML 길이가 같아야 하는 횟수
const REQUIRED_STABLE_CHECKS: u32 = 3;

pub struct BrowserFetcher {
    config: ScraperConfig,
    browser: Option<Browser>,
}

impl BrowserFetcher {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
        }
    }

    fn get_browser(&self) -> Result<&Browser, MallError> {
        self.browser
            .as_ref()
            .ok_or_else(|| MallError::BrowserInit("Browser not initialized".to_string()))
    }

    /// HTML 길이가 연속으로 같아질 때까지 기다린다
    async fn wait_stable(&self, page: &Page) {
        let start = Instant::now();
        let timeout = Duration::from_millis(PAGE_STABLE_TIMEOUT_MS);

        let mut last_html_len: Option<usize> = None;
        let mut stable_count = 0;

        while start.elapsed() < timeout {
            match page.evaluate("document.documentElement.outerHTML.length").await {
                Ok(val) => {
                    let current_len = val.into_value::<usize>().unwrap_or(0);
                    match last_html_len {
                        Some(last) if last == current_len => {
                            stable_count += 1;
                            if stable_count >= REQUIRED_STABLE_CHECKS {
                                debug!("Page stable after {:?}", start.elapsed());
                                return;
                            }
                        }
                        _ => stable_count = 0,
                    }
                    last_html_len = Some(current_len);
                }
                Err(e) => {
                    debug!("Page stable check error: {}", e);
                    stable_count = 0;
                }
            }
            sleep(Duration::from_millis(PAGE_STABLE_CHECK_INTERVAL_MS)).await;
        }

        warn!("Page stable timeout after {:?}, proceeding anyway", start.elapsed());
    }

    async fn debug_screenshot(&self, page: &Page, url: &str) {
        if !self.config.debug {
            return;
        }
        if let Ok(screenshot) = page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
            debug!("Screenshot of {}: data:image/png;base64,{}", url, encoded);
        }
    }
}

/// 경로를 지정하지 않으면 chromiumoxide 가 실행 파일을 찾는다
fn browser_builder(config: &ScraperConfig) -> BrowserConfigBuilder {
    let mut builder = BrowserConfig::builder().window_size(1280, 900);
    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }
    if !config.headless {
        builder = builder.with_head();
    }
    builder
        .no_sandbox()
        .request_timeout(config.timeout)
        .arg(format!("--user-agent={}", config.user_agent))
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn initialize(&mut self) -> Result<(), MallError> {
        info!("Initializing browser...");

        let browser_config = browser_builder(&self.config)
            .build()
            .map_err(MallError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| MallError::BrowserInit(e.to_string()))?;

        // 브라우저 이벤트 핸들러는 백그라운드에서 돌린다
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        });

        self.browser = Some(browser);
        info!("Browser initialized");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<String, MallError> {
        let browser = self.get_browser()?;

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| MallError::Navigation(format!("{}: {}", url, e)))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| MallError::Navigation(format!("{}: {}", url, e)))?;

        self.wait_stable(&page).await;
        self.debug_screenshot(&page, url).await;

        let html = page
            .content()
            .await
            .map_err(|e| MallError::Navigation(format!("{}: {}", url, e)));

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        let html = html?;
        debug!("Rendered {} ({} bytes)", url, html.len());
        Ok(html)
    }

    async fn close(&mut self) -> Result<(), MallError> {
        if let Some(mut browser) = self.browser.take() {
            info!("Closing browser...");
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
        }
        Ok(())
    }
}
