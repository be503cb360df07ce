//! 몰 목록 페이지 수집
//!
//! 몰마다 따로 있던 수집 스크립트를 프로필(셀렉터 + URL 템플릿)과
//! 공통 엔진 하나로 바꾼 것이다.

mod browser;
mod fetcher;
mod mall_scraper;
mod parser;
mod profile;

pub use browser::BrowserFetcher;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use mall_scraper::MallScraper;
pub use parser::{normalize_ws, parse_listing, product_id, ParsedPage, ScrapedItem};
pub use profile::{MallProfile, Platform, RenderMode, SelectorOverrides, Selectors};
