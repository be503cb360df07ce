use async_trait::async_trait;

use crate::error::MallError;
use crate::model::Product;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// 페처(HTTP 클라이언트 / 브라우저) 준비
    async fn initialize(&mut self) -> Result<(), MallError>;

    /// 목록 페이지 수집
    async fn scrape(&mut self) -> Result<Vec<Product>, MallError>;

    /// 리소스 해제
    async fn close(&mut self) -> Result<(), MallError>;

    /// 일괄 실행 (initialize → scrape → close)
    ///
    /// 수집이 실패해도 close 는 호출한다.
    async fn execute(&mut self) -> Result<Vec<Product>, MallError> {
        self.initialize().await?;
        let result = self.scrape().await;
        self.close().await?;
        result
    }
}
