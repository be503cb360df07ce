//! 지역 공공 쇼핑몰 상품 수집 라이브러리
//!
//! - 몰별 프로필(목록 URL + CSS 셀렉터)로 상품 목록을 수집해 products.json 에 합친다
//! - products.json 을 이름 붙은 정리 패스로 고친다
//! - 상품·몰 목록을 JSON API 로 제공한다
//!
//! # 수집 사용 예
//!
//! ```rust,ignore
//! use local_mall_service::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScraperConfig::new("./data").with_headless(true);
//!     let mut service = ScraperService::new(config);
//!
//!     let request = ScrapeRequest::malls(["gwdmall"]).with_dry_run(true);
//!     let result = service.call(request).await.unwrap();
//!     println!("inserted: {}, updated: {}", result.inserted, result.updated);
//! }
//! ```
//!
//! # 정리 패스 사용 예
//!
//! ```rust,ignore
//! use local_mall_service::repair::{run_passes, RepairContext};
//! use local_mall_service::JsonStore;
//!
//! let store = JsonStore::new("./data");
//! let mut catalog = store.load_catalog().unwrap();
//! let ctx = RepairContext::new(&catalog.malls);
//! let report = run_passes(&mut catalog.products, &ctx, &[]).unwrap();
//! store.save_products(&catalog.products).unwrap();
//! ```

pub mod api;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod repair;
pub mod scrape;
pub mod service;
pub mod stats;
pub mod store;
pub mod traits;

// 주요 타입 리엑스포트
pub use classifier::{classify, classify_product, Category};
pub use config::{ScraperConfig, ServerConfig};
pub use error::MallError;
pub use model::{Mall, Price, Product, Region};
pub use scrape::{MallProfile, MallScraper};
pub use service::{ScrapeRequest, ScrapeResult, ScraperService};
pub use store::{Catalog, JsonStore};
pub use traits::Scraper;
