use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tower::Service;
use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::error::MallError;
use crate::model::{Mall, Product};
use crate::scrape::{MallProfile, MallScraper};
use crate::store::{merge_products, JsonStore, MergeStats};
use crate::traits::Scraper;

/// 수집 요청
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    pub mall_ids: Vec<String>,
    /// 활성화된 프로필 전부
    pub all: bool,
    /// 저장하지 않고 결과만
    pub dry_run: bool,
}

impl ScrapeRequest {
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn malls<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mall_ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// 몰 하나의 수집 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MallOutcome {
    pub mall_id: String,
    pub scraped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 수집 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub outcomes: Vec<MallOutcome>,
    pub inserted: usize,
    pub updated: usize,
    pub total_products: usize,
    pub saved: bool,
}

impl ScrapeResult {
    pub fn failed(&self) -> impl Iterator<Item = &MallOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// tower::Service 를 구현한 수집 서비스
///
/// 몰은 순서대로 하나씩 수집한다. 한 몰이 실패해도 나머지는 계속한다.
#[derive(Debug, Clone)]
pub struct ScraperService {
    config: ScraperConfig,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn store(&self) -> JsonStore {
        JsonStore::new(self.config.data_dir.clone()).with_backup(true)
    }
}

/// 요청에 해당하는 프로필. 모르는 몰 ID 는 Err 로 돌려준다.
fn select_profiles(
    profiles: Vec<MallProfile>,
    req: &ScrapeRequest,
) -> Vec<Result<MallProfile, String>> {
    if req.all {
        return profiles.into_iter().filter(|p| p.enabled).map(Ok).collect();
    }
    req.mall_ids
        .iter()
        .map(|id| {
            profiles
                .iter()
                .find(|p| &p.mall_id == id)
                .cloned()
                .ok_or_else(|| id.clone())
        })
        .collect()
}

async fn scrape_mall(
    config: &ScraperConfig,
    profile: MallProfile,
    malls: &[Mall],
) -> Result<Vec<Product>, MallError> {
    let mall = malls
        .iter()
        .find(|m| m.id == profile.mall_id)
        .cloned()
        .ok_or_else(|| MallError::NotFound(format!("mall {} is not in malls.json", profile.mall_id)))?;
    let mut scraper = MallScraper::new(config.clone(), profile, mall)?;
    scraper.execute().await
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = MallError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!(
            "Scrape request: all={}, malls={:?}, dry_run={}",
            req.all, req.mall_ids, req.dry_run
        );
        let config = self.config.clone();
        let store = self.store();

        Box::pin(async move {
            let profiles = store.load_profiles()?;
            let malls = store.load_malls()?;
            let mut products = store.load_products()?;

            let selected = select_profiles(profiles, &req);
            if selected.is_empty() {
                warn!("No scraper profiles matched the request");
            }

            let mut outcomes = Vec::with_capacity(selected.len());
            let mut scraped: Vec<Product> = Vec::new();

            for entry in selected {
                let profile = match entry {
                    Ok(profile) => profile,
                    Err(mall_id) => {
                        warn!("No scraper profile for mall {}", mall_id);
                        outcomes.push(MallOutcome {
                            mall_id,
                            scraped: 0,
                            error: Some("no scraper profile".to_string()),
                        });
                        continue;
                    }
                };

                let mall_id = profile.mall_id.clone();
                match scrape_mall(&config, profile, &malls).await {
                    Ok(found) => {
                        outcomes.push(MallOutcome {
                            mall_id,
                            scraped: found.len(),
                            error: None,
                        });
                        scraped.extend(found);
                    }
                    Err(e) => {
                        error!("Scrape failed for {}: {}", mall_id, e);
                        outcomes.push(MallOutcome {
                            mall_id,
                            scraped: 0,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }

            let MergeStats { inserted, updated } = merge_products(&mut products, scraped);
            let saved = !req.dry_run && inserted + updated > 0;
            if saved {
                store.save_products(&products)?;
            }

            let result = ScrapeResult {
                outcomes,
                inserted,
                updated,
                total_products: products.len(),
                saved,
            };
            info!(
                "Scrape finished: inserted={}, updated={}, failed={}, total={}",
                result.inserted,
                result.updated,
                result.failed().count(),
                result.total_products
            );
            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::scrape::SelectorOverrides;

    #[test]
    fn test_scrape_request_builder() {
        let req = ScrapeRequest::malls(["gwd", "jeju"]).with_dry_run(true);

        assert_eq!(req.mall_ids, vec!["gwd", "jeju"]);
        assert!(!req.all);
        assert!(req.dry_run);
        assert!(ScrapeRequest::all().all);
    }

    #[test]
    fn test_select_profiles() {
        let mut disabled = MallProfile::new("b", "https://b.kr");
        disabled.enabled = false;
        let profiles = vec![MallProfile::new("a", "https://a.kr"), disabled];

        let all = select_profiles(profiles.clone(), &ScrapeRequest::all());
        assert_eq!(all.len(), 1);

        let picked = select_profiles(profiles, &ScrapeRequest::malls(["b", "zz"]));
        assert_eq!(picked[0].as_ref().map(|p| p.mall_id.as_str()), Ok("b"));
        assert_eq!(picked[1], Err("zz".to_string()));
    }

    async fn spawn_listing() -> std::net::SocketAddr {
        let app = Router::new().route(
            "/list",
            get(|| async {
                Html(
                    r#"<ul><li class="g"><a href="/view?goodsNo=7">횡성 한우 등심</a><span class="p">59,000원</span></li></ul>"#,
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn seed_store(dir: &std::path::Path, addr: std::net::SocketAddr) -> JsonStore {
        let store = JsonStore::new(dir);
        store
            .save_malls(&[Mall::new("hs", "횡성몰").with_region("강원")])
            .unwrap();
        let profile = MallProfile::new("hs", format!("http://{}/list", addr)).with_selectors(
            SelectorOverrides {
                item: Some("li.g".into()),
                name: Some("a".into()),
                price: Some(".p".into()),
                ..Default::default()
            },
        );
        std::fs::write(store.profiles_path(), serde_json::to_string(&[profile]).unwrap()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_service_scrapes_merges_and_saves() {
        let addr = spawn_listing().await;
        let dir = tempfile::tempdir().unwrap();
        let store = seed_store(dir.path(), addr);

        let config = ScraperConfig::new(dir.path()).with_page_delay(Duration::from_millis(0));
        let service = ScraperService::new(config);
        let result = service
            .oneshot(ScrapeRequest::malls(["hs", "missing"]))
            .await
            .unwrap();

        assert_eq!(result.inserted, 1);
        assert!(result.saved);
        assert_eq!(result.failed().count(), 1);

        let saved = store.load_products().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "hs-7");
        assert_eq!(saved[0].category.as_deref(), Some("축산물"));
        assert_eq!(saved[0].region.as_deref(), Some("강원"));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_save() {
        let addr = spawn_listing().await;
        let dir = tempfile::tempdir().unwrap();
        let store = seed_store(dir.path(), addr);

        let config = ScraperConfig::new(dir.path()).with_page_delay(Duration::from_millis(0));
        let result = ScraperService::new(config)
            .oneshot(ScrapeRequest::malls(["hs"]).with_dry_run(true))
            .await
            .unwrap();

        assert_eq!(result.inserted, 1);
        assert_eq!(result.total_products, 1);
        assert!(!result.saved);
        assert!(!store.products_path().exists());
    }
}
