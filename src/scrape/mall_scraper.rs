use std::collections::HashSet;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::browser::BrowserFetcher;
use super::fetcher::{HttpFetcher, PageFetcher};
use super::parser::{parse_listing, product_id, ScrapedItem};
use super::profile::{MallProfile, RenderMode, Selectors};
use crate::classifier::classify_product;
use crate::config::ScraperConfig;
use crate::error::MallError;
use crate::model::{parse_price_text, Mall, Price, Product, Region};
use crate::traits::Scraper;

/// 프로필 하나로 몰 하나를 수집한다
pub struct MallScraper {
    config: ScraperConfig,
    profile: MallProfile,
    mall: Mall,
    selectors: Selectors,
    fetcher: Option<Box<dyn PageFetcher>>,
}

impl MallScraper {
    pub fn new(config: ScraperConfig, profile: MallProfile, mall: Mall) -> Result<Self, MallError> {
        if profile.mall_id != mall.id {
            return Err(MallError::Config(format!(
                "profile {} does not belong to mall {}",
                profile.mall_id, mall.id
            )));
        }
        let selectors = Selectors::resolve(&profile)?;
        Ok(Self {
            config,
            profile,
            mall,
            selectors,
            fetcher: None,
        })
    }

    /// 테스트나 특수한 몰을 위해 페처를 직접 지정
    pub fn with_fetcher(mut self, fetcher: Box<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn mall_id(&self) -> &str {
        &self.mall.id
    }

    fn get_fetcher(&self) -> Result<&dyn PageFetcher, MallError> {
        self.fetcher
            .as_deref()
            .ok_or_else(|| MallError::Config("fetcher not initialized".to_string()))
    }

    fn to_product(&self, item: ScrapedItem) -> Product {
        let mut product = Product::new(product_id(&self.mall.id, &item.product_url));
        product.name = Some(item.name);
        product.price = item.price_text.as_deref().and_then(parse_price_text).map(Price::Amount);
        product.original_price = item
            .original_price_text
            .as_deref()
            .and_then(parse_price_text)
            .map(Price::Amount);
        product.image_url = item.image_url;
        product.product_url = Some(item.product_url);
        product.mall_id = Some(self.mall.id.clone());
        product.mall_name = Some(self.mall.name.clone());
        product.region = self
            .mall
            .region
            .as_deref()
            .and_then(Region::normalize)
            .or_else(|| Region::detect(&self.mall.name).map(Region::label))
            .map(str::to_string);
        classify_product(&mut product, false);
        product
    }
}

#[async_trait]
impl Scraper for MallScraper {
    async fn initialize(&mut self) -> Result<(), MallError> {
        if self.fetcher.is_none() {
            let fetcher: Box<dyn PageFetcher> = match self.profile.render {
                RenderMode::Static => Box::new(HttpFetcher::new(&self.config)?),
                RenderMode::Browser => Box::new(BrowserFetcher::new(self.config.clone())),
            };
            self.fetcher = Some(fetcher);
        }
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.initialize().await?;
        }
        Ok(())
    }

    async fn scrape(&mut self) -> Result<Vec<Product>, MallError> {
        let fetcher = self.get_fetcher()?;
        let pages = self.profile.page_count();
        info!("Scraping {} ({}), up to {} page(s)", self.mall.name, self.mall.id, pages);

        let mut products: Vec<Product> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut previous_page: Vec<String> = Vec::new();
        let mut skipped = 0;

        for page in 1..=pages {
            if page > 1 {
                sleep(self.config.page_delay).await;
            }

            let url = self.profile.page_url(page);
            let html = match fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!("{}: page {} failed, stopping: {}", self.mall.id, page, e);
                    break;
                }
            };

            let parsed = parse_listing(&html, &url, &self.selectors)?;
            skipped += parsed.skipped;
            if parsed.items.is_empty() {
                debug!("{}: page {} is empty, stopping", self.mall.id, page);
                break;
            }

            let page_products: Vec<Product> =
                parsed.items.into_iter().map(|item| self.to_product(item)).collect();
            let page_ids: Vec<String> = page_products.iter().map(|p| p.id.clone()).collect();
            if page_ids == previous_page {
                // 페이지 파라미터를 무시하고 같은 목록을 주는 몰
                debug!("{}: page {} repeats previous page, stopping", self.mall.id, page);
                break;
            }

            let before = products.len();
            products.extend(page_products.into_iter().filter(|p| seen.insert(p.id.clone())));
            debug!(
                "{}: page {} → {} new product(s)",
                self.mall.id,
                page,
                products.len() - before
            );
            previous_page = page_ids;
        }

        info!(
            "{}: {} product(s) scraped, {} item(s) skipped",
            self.mall.id,
            products.len(),
            skipped
        );
        Ok(products)
    }

    async fn close(&mut self) -> Result<(), MallError> {
        if let Some(mut fetcher) = self.fetcher.take() {
            fetcher.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;
    use serde::Deserialize;

    use super::*;
    use crate::scrape::SelectorOverrides;

    #[derive(Deserialize)]
    struct PageQuery {
        page: u32,
    }

    fn listing(page: u32) -> String {
        let items: String = (0..3)
            .map(|i| {
                let no = page * 100 + i;
                format!(
                    r#"<li class="item"><a href="/goods/view?goodsNo={no}"><img data-src="/img/{no}.jpg"></a>
                       <p class="name">제주 감귤 {no}호</p><p class="price">{price}원</p></li>"#,
                    no = no,
                    price = 10_000 + no
                )
            })
            .collect();
        format!("<html><body><ul class='list'>{}</ul></body></html>", items)
    }

    async fn spawn_mall(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn profile(base: &str, path: &str) -> MallProfile {
        MallProfile::new("jeju", format!("{}{}", base, path))
            .with_max_pages(5)
            .with_selectors(SelectorOverrides {
                item: Some("li.item".into()),
                name: Some(".name".into()),
                price: Some(".price".into()),
                ..Default::default()
            })
    }

    fn config() -> ScraperConfig {
        ScraperConfig::default()
            .with_page_delay(Duration::from_millis(0))
            .with_timeout(Duration::from_secs(5))
    }

    fn mall() -> Mall {
        Mall::new("jeju", "제주몰").with_region("제주특별자치도")
    }

    #[tokio::test]
    async fn test_scrape_paginated_until_empty_page() {
        let app = Router::new().route(
            "/list",
            get(|Query(q): Query<PageQuery>| async move {
                if q.page <= 2 {
                    Html(listing(q.page))
                } else {
                    Html("<html><body><ul class='list'></ul></body></html>".to_string())
                }
            }),
        );
        let base = spawn_mall(app).await;

        let mut scraper = MallScraper::new(config(), profile(&base, "/list?page={page}"), mall()).unwrap();
        let products = scraper.execute().await.unwrap();

        assert_eq!(products.len(), 6);
        let first = &products[0];
        assert_eq!(first.id, "jeju-100");
        assert_eq!(first.display_name(), Some("제주 감귤 100호"));
        assert_eq!(first.price_amount(), Some(10_100));
        assert_eq!(first.mall_name.as_deref(), Some("제주몰"));
        assert_eq!(first.region.as_deref(), Some("제주"));
        assert_eq!(first.category.as_deref(), Some("농산물"));
        assert_eq!(first.image_url, Some(format!("{}/img/100.jpg", base)));
    }

    #[tokio::test]
    async fn test_scrape_stops_when_page_param_is_ignored() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/best",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Html(listing(1))
                }
            }),
        );
        let base = spawn_mall(app).await;

        let mut scraper =
            MallScraper::new(config(), profile(&base, "/best?page={page}"), mall()).unwrap();
        let products = scraper.execute().await.unwrap();

        assert_eq!(products.len(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_error() {
        let app = Router::new().route("/list", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn_mall(app).await;

        let mut scraper = MallScraper::new(config(), profile(&base, "/list"), mall()).unwrap();
        let err = scraper.execute().await.unwrap_err();

        assert!(matches!(err, MallError::Http { status: Some(404), .. }));
        assert!(scraper.fetcher.is_none());
    }

    #[tokio::test]
    async fn test_scrape_stops_at_max_pages() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/list",
            get(move |Query(q): Query<PageQuery>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Html(listing(q.page))
                }
            }),
        );
        let base = spawn_mall(app).await;

        let profile = profile(&base, "/list?page={page}").with_max_pages(2);
        let mut scraper = MallScraper::new(config(), profile, mall()).unwrap();
        let products = scraper.execute().await.unwrap();

        assert_eq!(products.len(), 6);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_http_fetcher_retries_transient_statuses() {
        for transient in [StatusCode::SERVICE_UNAVAILABLE, StatusCode::TOO_MANY_REQUESTS] {
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();
            let app = Router::new().route(
                "/flaky",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(transient)
                        } else {
                            Ok(Html(listing(1)))
                        }
                    }
                }),
            );
            let base = spawn_mall(app).await;

            let fetcher = HttpFetcher::new(&config())
                .unwrap()
                .with_initial_backoff(Duration::from_millis(10));
            let html = fetcher.fetch(&format!("{}/flaky", base)).await.unwrap();

            assert!(html.contains("제주 감귤"), "status {}", transient);
            assert_eq!(hits.load(Ordering::SeqCst), 2, "status {}", transient);
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_does_not_retry_client_errors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/gone",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::FORBIDDEN
                }
            }),
        );
        let base = spawn_mall(app).await;

        let fetcher = HttpFetcher::new(&config())
            .unwrap()
            .with_initial_backoff(Duration::from_millis(10));
        let err = fetcher.fetch(&format!("{}/gone", base)).await.unwrap_err();

        assert!(matches!(err, MallError::Http { status: Some(403), .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_profile_must_match_mall() {
        let profile = MallProfile::new("other", "https://x.kr");
        assert!(matches!(
            MallScraper::new(config(), profile, mall()),
            Err(MallError::Config(_))
        ));
    }
}
